mod cli;
mod error;
mod output;

use std::fs::File;

use clap::Parser;

use cli::Args;
use error::Result;
use texton_pipeline::{InputImage, Params};

fn init_logging(args: &Args) {
    if args.quiet {
        return;
    }
    let filter = match args.verbose {
        0 => tracing::level_filters::LevelFilter::INFO,
        1 => tracing::level_filters::LevelFilter::DEBUG,
        2.. => tracing::level_filters::LevelFilter::TRACE,
    };
    let env_filter = tracing_subscriber::EnvFilter::builder().with_default_directive(filter.into()).from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn load_input(args: &Args) -> Result<InputImage> {
    let decoded = image::open(&args.input)?;
    let width = decoded.width() as usize;
    let height = decoded.height() as usize;

    let input = if args.grayscale {
        InputImage::Gray {
            width,
            height,
            data: decoded.to_luma8().into_raw(),
        }
    } else {
        InputImage::Rgb {
            width,
            height,
            data: decoded.to_rgb8().into_raw(),
        }
    };
    Ok(input)
}

fn run(args: Args) -> Result<()> {
    let input = load_input(&args)?;

    let params = Params {
        kmeans_k: args.kmeans_k,
        kmeans_iters: args.kmeans_iters,
        kmeans_prune: args.kmeans_prune,
        n_cropped_pixels: args.n_cropped_pixels,
        seed: args.seed,
        ..Params::default()
    };

    let pipeline_output = texton_pipeline::run(&input, &params)?;

    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| args.input.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| ".".into());
    std::fs::create_dir_all(&output_dir)?;

    let stem = args.input.file_stem().and_then(|s| s.to_str()).unwrap_or("texton").to_string();

    texton_histogram::write_histogram_image(File::create(output_dir.join(format!("{stem}.texton.histo")))?, &pipeline_output.texton_histogram)?;
    texton_histogram::write_histogram_image(File::create(output_dir.join(format!("{stem}.color.histo")))?, &pipeline_output.color_histogram)?;

    output::save_label_map_png(&pipeline_output.textons, &output_dir.join(format!("{stem}.textons.png")))?;
    output::save_label_map_png(&pipeline_output.texture_scale, &output_dir.join(format!("{stem}.texture_scale.png")))?;
    output::save_float_map_png(&pipeline_output.p_texture, &output_dir.join(format!("{stem}.p_texture.png")))?;
    output::save_float_map_png(&pipeline_output.dual_lattice.h, &output_dir.join(format!("{stem}.lattice_h.png")))?;
    output::save_float_map_png(&pipeline_output.dual_lattice.v, &output_dir.join(format!("{stem}.lattice_v.png")))?;
    output::save_mask_png(&pipeline_output.sparse_pattern, &output_dir.join(format!("{stem}.sparse_pattern.png")))?;

    tracing::info!(
        r_min = pipeline_output.r_min,
        r_max = pipeline_output.r_max,
        output_dir = %output_dir.display(),
        "wrote pipeline outputs"
    );

    Ok(())
}

fn main() -> std::process::ExitCode {
    let args = Args::parse();
    init_logging(&args);

    match run(args) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            std::process::ExitCode::FAILURE
        }
    }
}
