use super::co2_n2;
use approx::assert_relative_eq;
use ndarray::arr1;
use phasemap_core::{EnvelopeOptions, PhaseEnvelope};
use std::error::Error;

#[test]
fn test_phase_envelope() -> Result<(), Box<dyn Error>> {
    let eos = co2_n2()?;
    let z = arr1(&[0.85, 0.15]);
    let options = EnvelopeOptions::default();
    let envelope = PhaseEnvelope::trace(&eos, &z, options)?;
    println!("{} points", envelope.len());

    let p = envelope.pressures();
    let t = envelope.temperatures();
    assert_relative_eq!(p[0], 1e4, max_relative = 1e-8);
    assert!(p.iter().all(|&p| p >= 1e4 * (1.0 - 1e-8) && p <= 1.5e7));
    assert!(t.iter().all(|&t| t > 100.0 && t < 320.0));

    // dew and bubble branch
    assert!(envelope.points.iter().any(|p| p.ln_k[0] < 0.0));
    assert!(envelope.points.iter().any(|p| p.ln_k[0] > 0.0));
    let (tc, pc) = envelope.critical_point().ok_or("no critical point")?;
    assert!(tc > 280.0 && tc < 300.0);
    assert!(pc > 8e6 && pc < 1.1e7);

    // the incipient liquid at the first dew point is nearly pure CO2
    assert!(envelope.points[0].incipient_molefracs[0] > 0.99);
    Ok(())
}

#[test]
fn test_phase_envelope_max_points() -> Result<(), Box<dyn Error>> {
    let eos = co2_n2()?;
    let z = arr1(&[0.85, 0.15]);
    let options = EnvelopeOptions {
        max_points: 10,
        ..Default::default()
    };
    let envelope = PhaseEnvelope::trace(&eos, &z, options)?;
    assert_eq!(envelope.len(), 10);
    let t = envelope.temperatures();
    assert!(t.to_vec().windows(2).all(|w| w[1] > w[0]));
    Ok(())
}
