use crate::cli::InputArgs;
use crate::error::{CliError, Result};
use molframe::core::io::csv::read_directory;
use molframe::core::model::builder::build_models;
use molframe::engine::config::ModelConfig;
use molframe::engine::structure::Structure;
use std::sync::Arc;
use tracing::{debug, info};

/// Loads the input directory and builds a structure from the requested model.
pub fn load_structure(input: &InputArgs, config: ModelConfig) -> Result<Arc<Structure>> {
    info!("Loading categories from {:?}", &input.input);
    let data = read_directory(&input.input).map_err(|e| CliError::FileParsing {
        path: input.input.clone(),
        source: e.into(),
    })?;

    let label = input
        .input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("structure");
    let mut models = build_models(&data, label)?;
    debug!("Input holds {} model(s).", models.len());

    if input.model >= models.len() {
        return Err(CliError::Argument(format!(
            "Model index {} is out of range; the input holds {} model(s)",
            input.model,
            models.len()
        )));
    }
    let model = models.swap_remove(input.model);
    info!(
        "Using model {} with {} atoms.",
        model.model_num,
        model.atom_count()
    );
    Ok(Arc::new(Structure::from_model(Arc::new(model), config)))
}
