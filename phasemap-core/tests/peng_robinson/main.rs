use phasemap_core::cubic::{PengRobinson, PengRobinsonParameters};
use phasemap_core::parameter::{IdentifierOption, Parameter, ParameterError};
use std::sync::Arc;

mod phase_envelope;
mod stability_analysis;
mod state_creation;
mod tp_flash;

fn read_params(components: Vec<&str>) -> Result<Arc<PengRobinson>, ParameterError> {
    let parameters = PengRobinsonParameters::from_json(
        components,
        "tests/peng_robinson/test_parameters.json",
        Some("tests/peng_robinson/test_binary_parameters.json"),
        IdentifierOption::Name,
    )?;
    Ok(Arc::new(PengRobinson::new(Arc::new(parameters))))
}

fn co2_n2() -> Result<Arc<PengRobinson>, ParameterError> {
    read_params(vec!["carbon dioxide", "nitrogen"])
}
