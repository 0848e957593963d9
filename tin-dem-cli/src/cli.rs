use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use tin_dem_core::{settings::DemSettings, Scalar};
use tin_dem_image::settings::{ImageDepth, ValueRange};

#[derive(Clone, Debug, Parser)]
#[command(name = "tin-dem", version, author, about)]
#[command(help_template = "\
{name} {version}
{about}
{author}

{usage-heading}
{tab}{usage}

{all-args}
")]
pub struct CliArgs {
    #[command(subcommand)]
    pub action: Action,
}

impl CliArgs {
    pub fn common(&self) -> &CommonArgs {
        match &self.action {
            Action::Grid { common, .. } => common,
            Action::Image { common, .. } => common,
            Action::Mesh { common, .. } => common,
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct CommonArgs {
    /// Input XYZ file path
    #[arg(short, long, value_name = "PATH", value_hint(ValueHint::FilePath))]
    pub input: PathBuf,

    /// Output file path
    #[arg(short, long, value_name = "PATH", value_hint(ValueHint::FilePath))]
    pub output: PathBuf,

    /// YAML or JSON settings file, flags below override its values
    #[arg(long, value_name = "PATH", value_hint(ValueHint::FilePath))]
    pub settings: Option<PathBuf>,

    /// Pixel size in input units
    #[arg(long, value_name = "NUMBER")]
    pub pixel_size: Option<Scalar>,

    /// Value of pixels without data, minimum height when not set
    #[arg(long, value_name = "NUMBER", allow_negative_numbers = true)]
    pub background: Option<Scalar>,

    /// Triangles with a longer edge are not interpolated, 0 keeps all
    #[arg(long, value_name = "NUMBER")]
    pub max_edge_length: Option<Scalar>,

    /// Relative tolerance of geometric tests
    #[arg(long, value_name = "NUMBER")]
    pub tolerance: Option<Scalar>,

    /// Log settings used and progress
    #[arg(long)]
    pub verbose: bool,
}

impl CommonArgs {
    /// Overrides settings with values given on the command line.
    pub fn apply(&self, mut settings: DemSettings) -> DemSettings {
        if let Some(pixel_size) = self.pixel_size {
            settings.pixel_size = pixel_size;
        }
        if let Some(background) = self.background {
            settings.background = Some(background);
        }
        if let Some(max_edge_length) = self.max_edge_length {
            settings.max_edge_length = max_edge_length;
        }
        if let Some(tolerance) = self.tolerance {
            settings.tolerance = tolerance;
        }
        settings
    }
}

#[derive(Clone, Copy, Debug, Default, strum::Display, ValueEnum)]
pub enum DepthSelection {
    #[default]
    #[value(name = "8")]
    #[strum(serialize = "8")]
    Eight,
    #[value(name = "16")]
    #[strum(serialize = "16")]
    Sixteen,
}
impl From<DepthSelection> for ImageDepth {
    fn from(value: DepthSelection) -> Self {
        match value {
            DepthSelection::Eight => ImageDepth::Eight,
            DepthSelection::Sixteen => ImageDepth::Sixteen,
        }
    }
}

#[derive(Clone, Debug, Subcommand)]
pub enum Action {
    /// Produce elevation grid
    #[command(help_template = "\
{name}
{about}

{usage-heading}
{tab}{usage}

{all-args}
")]
    Grid {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        format: DataFormat,
    },

    /// Produce grayscale PNG of elevation grid
    #[command(help_template = "\
{name}
{about}

{usage-heading}
{tab}{usage}

{all-args}
")]
    Image {
        #[command(flatten)]
        common: CommonArgs,

        /// Bits per channel
        #[arg(long, value_name = "BITS", default_value_t)]
        depth: DepthSelection,

        /// Make pixels without data transparent
        #[arg(long)]
        transparent_background: bool,

        /// Heights mapped to black and white
        ///
        /// Accepts either `auto` or a range in the format of `MIN..MAX`
        #[arg(long, value_name = "RANGE", default_value_t = ValueRange::Auto, allow_hyphen_values = true)]
        range: ValueRange,
    },

    /// Produce triangulated irregular network
    #[command(help_template = "\
{name}
{about}

{usage-heading}
{tab}{usage}

{all-args}
")]
    Mesh {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        format: MeshFormat,
    },
}

#[derive(Clone, Debug, Args)]
#[group(required = true)]
pub struct DataFormat {
    /// Produce JSON grid
    #[arg(long)]
    pub json: bool,

    /// Produce pretty JSON grid
    #[arg(long)]
    pub json_pretty: bool,

    /// Produce YAML grid
    #[arg(long)]
    pub yaml: bool,
}

#[derive(Clone, Debug, Args)]
#[group(required = true)]
pub struct MeshFormat {
    /// Produce JSON mesh
    #[arg(long)]
    pub json: bool,

    /// Produce pretty JSON mesh
    #[arg(long)]
    pub json_pretty: bool,

    /// Produce YAML mesh
    #[arg(long)]
    pub yaml: bool,

    /// Produce OBJ mesh
    #[arg(long)]
    pub obj: bool,
}
