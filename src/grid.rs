use crate::config::MapConfig;
use ndarray::Array1;

/// Temperature and pressure axes of the density map.
///
/// Row `i` of a density grid belongs to `temperatures[i]`, column `j`
/// to `pressures[j]`.
#[derive(Clone, Debug, PartialEq)]
pub struct GridAxes {
    /// Temperatures in K
    pub temperatures: Array1<f64>,
    /// Pressures in Pa
    pub pressures: Array1<f64>,
}

impl GridAxes {
    pub fn new(temperatures: Array1<f64>, pressures: Array1<f64>) -> Self {
        Self {
            temperatures,
            pressures,
        }
    }

    pub fn from_config(config: &MapConfig) -> Self {
        let t = &config.temperature;
        let p = &config.pressure;
        Self::new(
            Array1::linspace(t.min, t.max, t.points),
            Array1::linspace(p.min, p.max, p.points),
        )
    }

    /// Shape (n_T, n_p) of the density grids.
    pub fn shape(&self) -> (usize, usize) {
        (self.temperatures.len(), self.pressures.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_axes() {
        let axes = GridAxes::from_config(&MapConfig::default());
        assert_eq!(axes.shape(), (500, 500));
        assert_relative_eq!(axes.temperatures[0], 263.15);
        assert_relative_eq!(axes.temperatures[499], 298.15, max_relative = 1e-14);
        assert_relative_eq!(axes.pressures[0], 4e6);
        assert_relative_eq!(axes.pressures[499], 1e7, max_relative = 1e-14);
        assert!(axes
            .pressures
            .to_vec()
            .windows(2)
            .all(|w| w[1] > w[0]));
    }
}
