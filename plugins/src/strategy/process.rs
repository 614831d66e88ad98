use async_trait::async_trait;

use maptoposter_core::api::{
    CommandSpec, ExecutionStrategy, GenerationRequest, JobError, ProcessStrategyConfig,
    RawSignal, StrategySession, SupervisedProcess,
};

/// Runs the poster worker as a child process per job.
pub struct ProcessStrategy {
    base: CommandSpec,
}

impl ProcessStrategy {
    pub fn new(cfg: &ProcessStrategyConfig) -> Self {
        Self {
            base: CommandSpec {
                program: cfg.program.clone(),
                args: cfg.args.clone(),
                cwd: cfg.workdir.clone(),
                envs: cfg.env.clone(),
            },
        }
    }

    pub fn command_for(&self, request: &GenerationRequest) -> CommandSpec {
        self.base.clone().args(worker_args(request))
    }
}

/// One flag per request field; absent options are left out.
pub fn worker_args(request: &GenerationRequest) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--city".into(),
        request.city.clone(),
        "--country".into(),
        request.country.clone(),
        "--distance".into(),
        request.distance.to_string(),
    ];

    if request.all_themes {
        args.push("--all-themes".into());
    } else {
        args.push("--theme".into());
        args.push(request.effective_theme().to_string());
    }

    args.push("--format".into());
    args.push(request.format.clone());

    let mut opt = |flag: &str, value: Option<String>| {
        if let Some(v) = value {
            args.push(flag.to_string());
            args.push(v);
        }
    };

    opt("--name-label", request.name_label.clone());
    opt("--country-label", request.country_label.clone());

    let layers: Vec<_> = request.enabled_layers().collect();
    if !layers.is_empty() {
        opt("--layers", serde_json::to_string(&layers).ok());
    }
    opt(
        "--colors",
        request
            .color_overrides()
            .and_then(|c| serde_json::to_string(c).ok()),
    );
    opt("--dpi", request.dpi.map(|v| v.to_string()));
    opt("--margins", request.margins.map(|v| v.to_string()));
    opt("--paper-size", request.paper_size.clone());
    opt("--width", request.width.map(|v| v.to_string()));
    opt("--height", request.height.map(|v| v.to_string()));

    args
}

#[async_trait]
impl ExecutionStrategy for ProcessStrategy {
    fn name(&self) -> &str {
        "process"
    }

    async fn submit(
        &self,
        request: &GenerationRequest,
    ) -> Result<Box<dyn StrategySession>, JobError> {
        let spec = self.command_for(request);
        tracing::info!(target: "maptoposter.supervisor", command = %spec.display(), "starting worker");

        let proc = SupervisedProcess::start(&spec).map_err(|e| JobError::Spawn {
            message: format!("Could not start the poster worker: {e}"),
            detail: std::error::Error::source(&e).map(|s| s.to_string()),
        })?;

        Ok(Box::new(ProcessSession { proc: Some(proc) }))
    }
}

struct ProcessSession {
    proc: Option<SupervisedProcess>,
}

#[async_trait]
impl StrategySession for ProcessSession {
    async fn next_signal(&mut self) -> Option<Result<RawSignal, JobError>> {
        let proc = self.proc.as_mut()?;
        if let Some(tap) = proc.next_line().await {
            return Some(Ok(RawSignal::Line(tap)));
        }

        // Both pipes closed: collect the exit. Dropping this future kills
        // the child since the handle goes with it.
        let proc = self.proc.take()?;
        Some(match proc.wait().await {
            Ok(outcome) => Ok(RawSignal::Exited(outcome)),
            Err(e) => Err(JobError::worker(format!("Lost track of the worker: {e}"), None)),
        })
    }

    fn cancel(&mut self) {
        if let Some(proc) = self.proc.as_mut() {
            proc.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use maptoposter_core::api::{CustomColors, CustomLayer};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn minimal_request_maps_to_required_flags() {
        let req = GenerationRequest::new("Paris", "France");
        assert_eq!(
            worker_args(&req),
            vec![
                "--city", "Paris", "--country", "France", "--distance", "10000", "--theme",
                "feature_based", "--format", "png",
            ]
        );
    }

    #[test]
    fn full_request_maps_every_option() {
        let mut req = GenerationRequest::new("Oslo", "Norway");
        req.all_themes = true;
        req.format = "svg".into();
        req.name_label = Some("OSLO".into());
        req.country_label = Some("NORGE".into());
        req.custom_layers = vec![
            CustomLayer {
                label: "Cafes".into(),
                tags: serde_json::json!({"amenity": "cafe"})
                    .as_object()
                    .cloned()
                    .unwrap(),
                color: "#ff0000".into(),
                width: None,
                enabled: true,
            },
            CustomLayer {
                label: "Hidden".into(),
                tags: Default::default(),
                color: "#000".into(),
                width: None,
                enabled: false,
            },
        ];
        req.custom_colors = Some(CustomColors {
            bg: Some("#111".into()),
            ..CustomColors::default()
        });
        req.dpi = Some(150);
        req.margins = Some(0.5);
        req.paper_size = Some("A2".into());
        req.width = Some(16.5);
        req.height = Some(23.4);

        let args = worker_args(&req);
        let value = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .map(|i| args[i + 1].clone())
        };

        assert!(args.contains(&"--all-themes".to_string()));
        assert!(!args.contains(&"--theme".to_string()));
        assert_eq!(value("--format").as_deref(), Some("svg"));
        assert_eq!(value("--name-label").as_deref(), Some("OSLO"));
        assert_eq!(value("--country-label").as_deref(), Some("NORGE"));
        assert_eq!(
            value("--layers").as_deref(),
            Some(r##"[{"label":"Cafes","tags":{"amenity":"cafe"},"color":"#ff0000","enabled":true}]"##)
        );
        assert_eq!(value("--colors").as_deref(), Some(r##"{"bg":"#111"}"##));
        assert_eq!(value("--dpi").as_deref(), Some("150"));
        assert_eq!(value("--margins").as_deref(), Some("0.5"));
        assert_eq!(value("--paper-size").as_deref(), Some("A2"));
        assert_eq!(value("--width").as_deref(), Some("16.5"));
        assert_eq!(value("--height").as_deref(), Some("23.4"));
    }

    #[test]
    fn base_args_come_first() {
        let strategy = ProcessStrategy::new(&ProcessStrategyConfig {
            program: "python3".into(),
            args: vec!["create_map_poster.py".into()],
            ..ProcessStrategyConfig::default()
        });
        let spec = strategy.command_for(&GenerationRequest::new("Rome", "Italy"));
        assert_eq!(spec.program, "python3");
        assert_eq!(spec.args[0], "create_map_poster.py");
        assert_eq!(spec.args[1], "--city");
    }
}
