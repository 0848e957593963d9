mod cli;
mod error;
mod xyz;

use crate::{
    cli::{Action, CliArgs, CommonArgs, DataFormat, MeshFormat},
    error::Result,
    xyz::read_xyz,
};
use clap::Parser;
use image::ImageFormat;
use obj_exporter::{Geometry, ObjSet, Object, Primitive, Shape, Vertex};
use std::{
    fs::{read_to_string, write, File},
    io::BufReader,
    path::Path,
    process::ExitCode,
};
use tin_dem_core::prelude::*;
use tin_dem_image::{generate_dem_image, DemImageSettings};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_logging(args.common().verbose);
    match run_app(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {}", error);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "info" } else { "warn" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_app(args: CliArgs) -> Result<()> {
    match args.action {
        Action::Grid { common, format } => {
            let output = generate(&common)?;
            write_data(&common.output, &format, &output.grid)
        }
        Action::Image {
            common,
            depth,
            transparent_background,
            range,
        } => {
            let settings = DemImageSettings {
                depth: depth.into(),
                range,
                transparent_background,
            };
            if common.verbose {
                tracing::info!("{:#?}", settings);
            }
            let output = generate(&common)?;
            let image = generate_dem_image(&output.grid, &settings)?;
            image.save_with_format(&common.output, ImageFormat::Png)?;
            Ok(())
        }
        Action::Mesh { common, format } => {
            let settings = load_settings(&common)?;
            let triangulation = triangulate(read_points(&common.input)?, &settings)?;
            write_mesh(&common.output, &format, &triangulation)
        }
    }
}

fn load_settings(common: &CommonArgs) -> Result<DemSettings> {
    let settings = match &common.settings {
        Some(path) => {
            let contents = read_to_string(path)?;
            if path.extension().map_or(false, |ext| ext == "json") {
                serde_json::from_str(&contents)?
            } else {
                serde_yaml::from_str(&contents)?
            }
        }
        None => DemSettings::default(),
    };
    let settings = common.apply(settings);
    if common.verbose {
        tracing::info!("{:#?}", settings);
    }
    Ok(settings)
}

fn read_points(path: &Path) -> Result<PointSet> {
    read_xyz(BufReader::new(File::open(path)?))
}

fn generate(common: &CommonArgs) -> Result<DemOutput> {
    let settings = load_settings(common)?;
    let points = read_points(&common.input)?;
    if !common.verbose {
        let PointSet { x, y, z } = points;
        return Ok(generate_dem(x, y, z, &settings)?);
    }
    let mut generator = DemGenerator::from_points(points, settings);
    let mut reported = (GeneratorStage::Completed, usize::MAX);
    let mut stage = generator.stage();
    loop {
        let (current, limit, factor) = generator.progress();
        let step = (factor * 10.0) as usize;
        if reported != (stage, step) {
            reported = (stage, step);
            tracing::info!(
                ?stage,
                current,
                limit,
                "progress: {}%",
                (factor * 100.0).clamp(0.0, 100.0) as usize
            );
        }
        if generator.process()? == ProcessStatus::Completed {
            break;
        }
        stage = generator.stage();
    }
    Ok(generator
        .into_output()
        .ok_or(TinError::AlreadyCompleted)?)
}

fn write_data(path: &Path, format: &DataFormat, grid: &DemGrid) -> Result<()> {
    let contents = if format.json {
        serde_json::to_string(grid)?
    } else if format.json_pretty {
        serde_json::to_string_pretty(grid)?
    } else {
        serde_yaml::to_string(grid)?
    };
    write(path, contents)?;
    Ok(())
}

fn write_mesh(path: &Path, format: &MeshFormat, triangulation: &Triangulation) -> Result<()> {
    let contents = if format.json {
        serde_json::to_string(triangulation)?
    } else if format.json_pretty {
        serde_json::to_string_pretty(triangulation)?
    } else if format.yaml {
        serde_yaml::to_string(triangulation)?
    } else {
        obj_exporter::export_to_file(&mesh_objects(triangulation), path)?;
        return Ok(());
    };
    write(path, contents)?;
    Ok(())
}

fn mesh_objects(triangulation: &Triangulation) -> ObjSet {
    let points = triangulation.points();
    let object = Object {
        name: "tin".to_owned(),
        vertices: (0..points.len())
            .map(|i| Vertex {
                x: points.x[i],
                y: points.y[i],
                z: points.z[i],
            })
            .collect::<Vec<_>>(),
        tex_vertices: vec![],
        normals: vec![],
        geometry: vec![Geometry {
            material_name: None,
            shapes: triangulation
                .triangles()
                .iter()
                .map(|t| Shape {
                    primitive: Primitive::Triangle(
                        (t.a, None, None),
                        (t.b, None, None),
                        (t.c, None, None),
                    ),
                    groups: vec![],
                    smoothing_groups: vec![],
                })
                .collect::<Vec<_>>(),
        }],
    };
    ObjSet {
        material_library: None,
        objects: vec![object],
    }
}
