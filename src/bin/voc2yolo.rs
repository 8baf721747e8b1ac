//! VOC -> YOLO label converter
//!
//! Reads every `.xml` annotation in the input directory and writes one
//! `<stem>.txt` label file per annotation into the output directory.
use anyhow::{bail, Result};
use clap::Parser;
use log::info;

use ppe_detect::io::{convert_directory, count_label_files, load_class_list};
use ppe_detect::ConvertArgs;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = ConvertArgs::parse();

    if !args.input_dir.is_dir() {
        bail!("input directory {} does not exist", args.input_dir.display());
    }

    let classes = load_class_list(&args.classes)?;
    let allow_list = if args.only.is_empty() {
        None
    } else {
        info!("Keeping only: {}", args.only.join(", "));
        Some(args.only.as_slice())
    };

    let stats = convert_directory(
        &args.input_dir,
        &args.output_dir,
        &classes,
        allow_list,
        args.precision,
    )?;
    stats.print_summary("Conversion");

    println!("Converted.. {} images", count_label_files(&args.output_dir)?);
    Ok(())
}
