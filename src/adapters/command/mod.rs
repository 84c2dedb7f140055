use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, error};

use crate::application::ports::PredictorPort;
use crate::domain::{
    errors::{DomainError, DomainResult},
    model::{PredictionOutcome, PredictionRequest},
};

/// Predictor externo ejecutado como subproceso.
///
/// El programa recibe las rutas y opciones como argumentos y debe imprimir,
/// como última línea no vacía de stdout, un JSON
/// `{"output_path": "...", "output_type": "..."}`.
pub struct CommandPredictor {
    program: String,
    args: Vec<String>,
}

#[derive(Deserialize)]
struct CommandReply {
    output_path: PathBuf,
    output_type: String,
}

impl CommandPredictor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }

    fn command_for(&self, req: &PredictionRequest) -> Command {
        let opts = &req.options;
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("--input")
            .arg(&req.input_path)
            .arg("--output")
            .arg(&req.output_path)
            .arg("--model")
            .arg(&opts.model_name)
            .arg("--min-conf")
            .arg(opts.min_conf.to_string())
            .arg("--min-iou")
            .arg(opts.min_iou.to_string());

        for (flag, on) in [
            ("--tta", opts.tta),
            ("--ensemble", opts.ensemble),
            ("--enhance-labels", opts.enhance_labels),
            ("--segmentation", opts.segmentation),
        ] {
            if on {
                cmd.arg(flag);
            }
        }
        cmd.kill_on_drop(true);
        cmd
    }
}

fn parse_reply(stdout: &str) -> DomainResult<PredictionOutcome> {
    let line = stdout
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| DomainError::OperationFailed("el predictor no devolvió nada".into()))?;
    let reply: CommandReply = serde_json::from_str(line.trim())
        .map_err(|e| DomainError::OperationFailed(format!("respuesta del predictor inválida ({e}): {line}")))?;
    Ok(PredictionOutcome { output_path: reply.output_path, output_type: reply.output_type })
}

#[async_trait]
impl PredictorPort for CommandPredictor {
    async fn predict(&self, request: PredictionRequest) -> DomainResult<PredictionOutcome> {
        let mut cmd = self.command_for(&request);
        debug!("Lanzando predictor: {:?}", cmd.as_std());

        let output = cmd
            .output()
            .await
            .map_err(|e| DomainError::OperationFailed(format!("no se pudo lanzar {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("❌ Predictor terminó con {}: {}", output.status, stderr.trim());
            return Err(DomainError::OperationFailed(format!(
                "{} terminó con {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        parse_reply(&String::from_utf8_lossy(&output.stdout))
    }
}
