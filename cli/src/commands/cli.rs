use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use maptoposter_core::api::{CustomColors, CustomLayer, GenerationRequest};
use maptoposter_core::error::CliError;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Render city map posters and stream their progress")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ./config.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `maptoposter.bridge=trace`. `RUST_LOG` wins.
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP server.
    Serve(ServeArgs),
    /// Render one poster and print its progress.
    Generate(GenerateArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    /// Directory served under `/posters`.
    #[arg(long)]
    pub artifacts_dir: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(long)]
    pub city: String,

    #[arg(long)]
    pub country: String,

    /// Search radius in metres.
    #[arg(long, default_value_t = 10_000)]
    pub distance: i64,

    #[arg(long, conflicts_with = "all_themes")]
    pub theme: Option<String>,

    #[arg(long, default_value_t = false)]
    pub all_themes: bool,

    #[arg(long, default_value = "png")]
    pub format: String,

    #[arg(long)]
    pub name_label: Option<String>,

    #[arg(long)]
    pub country_label: Option<String>,

    /// Custom layers as a JSON array.
    #[arg(long)]
    pub layers: Option<String>,

    /// Color overrides as a JSON object (`bg`, `water`, `parks`, `roads`, `text`).
    #[arg(long)]
    pub colors: Option<String>,

    #[arg(long)]
    pub dpi: Option<u32>,

    #[arg(long)]
    pub margins: Option<f64>,

    #[arg(long)]
    pub paper_size: Option<String>,

    #[arg(long)]
    pub width: Option<f64>,

    #[arg(long)]
    pub height: Option<f64>,

    /// Send the job to a running `maptoposter serve` instead of running it here.
    #[arg(long)]
    pub server: Option<String>,

    /// Print raw event frames instead of human-readable lines.
    #[arg(long, default_value_t = false)]
    pub raw: bool,
}

impl GenerateArgs {
    pub fn to_request(&self) -> Result<GenerationRequest, CliError> {
        let mut req = GenerationRequest::new(self.city.clone(), self.country.clone());
        req.distance = self.distance;
        req.theme = self.theme.clone();
        req.all_themes = self.all_themes;
        req.format = self.format.to_ascii_lowercase();
        req.name_label = self.name_label.clone();
        req.country_label = self.country_label.clone();
        req.dpi = self.dpi;
        req.margins = self.margins;
        req.paper_size = self.paper_size.clone();
        req.width = self.width;
        req.height = self.height;

        if let Some(raw) = &self.layers {
            req.custom_layers = serde_json::from_str::<Vec<CustomLayer>>(raw)
                .map_err(|e| CliError::Command(format!("--layers is not a valid layer list: {e}")))?;
        }
        if let Some(raw) = &self.colors {
            req.custom_colors = Some(
                serde_json::from_str::<CustomColors>(raw)
                    .map_err(|e| CliError::Command(format!("--colors is not a valid color object: {e}")))?,
            );
        }
        Ok(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_args_build_request() {
        let args = Args::parse_from([
            "maptoposter",
            "generate",
            "--city",
            "Paris",
            "--country",
            "France",
            "--theme",
            "noir",
            "--format",
            "SVG",
            "--layers",
            r##"[{"label":"Cafes","tags":{"amenity":"cafe"},"color":"#fff"}]"##,
        ]);
        let Commands::Generate(gen) = args.command else {
            panic!("expected generate");
        };
        let req = gen.to_request().unwrap();
        assert_eq!(req.theme.as_deref(), Some("noir"));
        assert_eq!(req.format, "svg");
        assert_eq!(req.custom_layers.len(), 1);
        assert!(req.custom_layers[0].enabled);
        req.validate().unwrap();
    }

    #[test]
    fn theme_and_all_themes_conflict() {
        let res = Args::try_parse_from([
            "maptoposter",
            "generate",
            "--city",
            "Paris",
            "--country",
            "France",
            "--theme",
            "noir",
            "--all-themes",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn bad_colors_json_is_command_error() {
        let args = Args::parse_from([
            "maptoposter",
            "generate",
            "--city",
            "Paris",
            "--country",
            "France",
            "--colors",
            "{nope",
        ]);
        let Commands::Generate(gen) = args.command else {
            panic!()
        };
        assert!(matches!(gen.to_request(), Err(CliError::Command(_))));
    }
}
