use llm_bench::backend::ApiFlavor;

use crate::args::CommonArgs;

use super::error::ConfigError;
use super::types::BenchConfig;

impl BenchConfig {
    /// Applies command-line flags on top of the file values.
    pub fn apply_args(&mut self, args: &CommonArgs) -> Result<(), ConfigError> {
        if let Some(api) = &args.api {
            self.backend.api = api.parse()?;
        }
        if let Some(backend) = &args.backend {
            // `--backend vllm` alone also selects the matching wire format.
            if args.api.is_none() {
                if let Ok(flavor) = backend.parse::<ApiFlavor>() {
                    self.backend.api = flavor;
                }
            }
            self.backend.name = Some(backend.clone());
        }
        if let Some(host) = &args.host {
            self.backend.host = host.clone();
        }
        if let Some(port) = args.port {
            self.backend.port = port;
        }
        if let Some(model) = &args.model {
            self.backend.model = Some(model.clone());
        }
        if let Some(parallel) = args.parallel {
            self.dispatch.concurrency = parallel;
        }
        if let Some(mode) = &args.mode {
            self.dispatch.mode = mode.parse()?;
        }
        if let Some(path) = &args.result_file {
            self.output.result_file = path.clone();
        }
        if let Some(num_gpus) = args.num_gpus {
            self.output.num_gpus = num_gpus;
        }
        if let Some(dir) = &args.dump_dir {
            self.output.dump_dir = Some(dir.clone());
        }
        Ok(())
    }
}
