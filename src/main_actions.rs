use crate::{
    cli::CrdFormat,
    crds::Function,
    operator::{ConfigLocation, Operator},
};
use anyhow::{Context, Ok, Result as AnyResult};
use kube::Client as KubeClient;
use std::path::PathBuf;
use tracing::{trace_span, Instrument};

pub async fn create_and_run_operator_controller(config_location: ConfigLocation) -> AnyResult<()> {
    let client = KubeClient::try_default()
        .await
        .context("Failed to create kubernetes client")?;

    let ConfigLocation { name, namespace } = &config_location;
    tracing::info!(config_map = %name, config_map_namespace = %namespace, "Running with current config.");

    let span = trace_span!("Create", config_map = %name, config_map_namespace = %namespace);

    let operator = Operator::new_with_check_config_map(client, config_location)
        .instrument(span)
        .await;

    operator.run().await;

    Ok(())
}

pub fn generate_crd(format: CrdFormat) -> AnyResult<String> {
    match format {
        CrdFormat::Yaml => Function::generate_crd_yaml().context("Failed to generate crd"),
        CrdFormat::Json => Function::generate_crd_json().context("Failed to generate crd"),
    }
}

pub fn print_crd(format: CrdFormat) -> AnyResult<()> {
    println!("{}", generate_crd(format)?);
    Ok(())
}

pub async fn write_crd_to_file(path: PathBuf, format: CrdFormat) -> AnyResult<()> {
    let crd = generate_crd(format)?;
    tokio::fs::write(path, crd)
        .await
        .context("Failed to write crd to file")?;
    Ok(())
}
