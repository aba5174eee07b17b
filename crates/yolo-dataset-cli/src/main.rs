// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use clap::{Parser, Subcommand};
use inquire::Confirm;
use log::info;
use std::{fs, path::PathBuf};
use yolo_dataset::{
    Dataset, DatasetLoader, DatasetStats, Error, Label, Progress, RenameOutcome, Settings, Shape,
    SortOrder, create_thumbnail, filter_images, image_dimensions, render_preview,
};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dataset root containing data.yaml, images/ and labels/
    #[clap(long, short, env = "YOLO_DM_DATASET", default_value = ".")]
    dataset: PathBuf,

    /// Settings file, overriding the per-user settings
    #[clap(long, env = "YOLO_DM_CONFIG")]
    config: Option<PathBuf>,

    /// Dataset Command
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum Command {
    /// List the classes defined in data.yaml.
    Classes {
        /// Show how many images contain each class
        #[clap(long, short)]
        counts: bool,
    },
    /// List images, optionally restricted to a class or a name filter.
    Images {
        /// Only images with at least one label of this class (name or index)
        #[clap(long, short)]
        class: Option<String>,

        /// Case-insensitive substring the image name must contain
        #[clap(long, short)]
        filter: Option<String>,

        /// Sort image names in descending order
        #[clap(long)]
        descending: bool,
    },
    /// Show the labels of an image.
    Show {
        /// Image file name
        image: String,
    },
    /// Print label statistics for the dataset.
    Stats {
        /// Also print a bar chart of labels per class
        #[clap(long)]
        chart: bool,
    },
    /// Add a label to an image.  Four coordinates describe a box
    /// (cx cy w h), more describe a polygon (x1 y1 x2 y2 ...).
    AddLabel {
        /// Image file name
        image: String,

        /// Class name or index
        class: String,

        /// Normalized coordinates
        #[clap(required = true, num_args = 4..)]
        coords: Vec<f64>,
    },
    /// Delete a label from an image.
    DeleteLabel {
        /// Image file name
        image: String,

        /// Label index as shown by `show`
        index: usize,
    },
    /// Change the class of a label.
    SetClass {
        /// Image file name
        image: String,

        /// Label index as shown by `show`
        index: usize,

        /// New class name or index
        class: String,
    },
    /// Rename a class.  Renaming to the name of another class merges the
    /// two classes.
    RenameClass {
        /// Class name or index
        class: String,

        /// New class name
        new_name: String,
    },
    /// Rename an image and its label file, keeping the extension.
    RenameImage {
        /// Image file name
        image: String,

        /// New base name without extension
        new_name: String,
    },
    /// Delete images together with their label files.
    Delete {
        /// Image file names
        #[clap(required = true)]
        images: Vec<String>,

        /// Do not ask for confirmation
        #[clap(long, short)]
        yes: bool,
    },
    /// Write square PNG thumbnails of the dataset images.
    Thumbnails {
        /// Output directory
        output: PathBuf,

        /// Only images with at least one label of this class (name or index)
        #[clap(long, short)]
        class: Option<String>,

        /// Thumbnail edge length, defaults to the configured size
        #[clap(long)]
        size: Option<u32>,
    },
    /// Render an image with its labels drawn as boxes.
    Preview {
        /// Image file name
        image: String,

        /// Output PNG file
        output: PathBuf,

        /// Preview edge length, defaults to the configured size
        #[clap(long)]
        size: Option<u32>,
    },
}

// Command handler functions

async fn load_dataset(args: &Args, settings: &Settings) -> Result<Dataset, Error> {
    use indicatif::{ProgressBar, ProgressStyle};
    use tokio::sync::mpsc;

    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template(
        "[{elapsed_precise} ETA: {eta}] {msg}: {wide_bar:.yellow} {human_pos}/{human_len}",
    ) {
        bar.set_style(style.progress_chars("█▇▆▅▄▃▂▁  "));
    }
    bar.set_message("Loading");

    let (tx, mut rx) = mpsc::channel::<Progress>(1);

    let consumer = bar.clone();
    tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            if progress.total > 0 {
                consumer.set_length(progress.total as u64);
                consumer.set_position(progress.current as u64);
            }
        }
    });

    let dataset = DatasetLoader::new(settings.clone())
        .load_in_background(args.dataset.clone(), Some(tx))
        .await;
    bar.finish_and_clear();
    dataset
}

fn handle_classes(dataset: &Dataset, counts: bool) -> Result<(), Error> {
    if counts {
        for (class_id, (name, images)) in dataset.class_image_counts().into_iter().enumerate() {
            println!("[{}] {}: {} images", class_id, name, images);
        }
    } else {
        for (class_id, name) in dataset.classes().iter().enumerate() {
            println!("[{}] {}", class_id, name);
        }
    }
    Ok(())
}

fn handle_images(
    dataset: &Dataset,
    class: Option<String>,
    filter: Option<String>,
    descending: bool,
) -> Result<(), Error> {
    let order = if descending {
        SortOrder::Descending
    } else {
        SortOrder::Ascending
    };

    let images = match class {
        Some(class) => dataset.images_for_class(dataset.resolve_class(&class)?, order),
        None => {
            let mut images: Vec<&str> = dataset.images().iter().map(String::as_str).collect();
            if order == SortOrder::Descending {
                images.reverse();
            }
            images
        }
    };

    let images = match filter {
        Some(filter) => filter_images(images, &filter),
        None => images,
    };

    for image in images {
        println!("{}", image);
    }
    Ok(())
}

fn handle_show(dataset: &Dataset, image: String) -> Result<(), Error> {
    let labels = dataset
        .labels(&image)
        .ok_or_else(|| Error::UnknownImage(image.clone()))?;
    let (width, height) = image_dimensions(&dataset.image_path(&image))?;

    println!("{} ({}x{}, {} labels)", image, width, height, labels.len());
    for (idx, label) in labels.iter().enumerate() {
        let class = dataset.class_name(label.class_id).unwrap_or("<unknown>");
        let pixels = label
            .bounding_box()
            .and_then(|bbox| bbox.to_pixels(width, height))
            .map(|rect| rect.to_string())
            .unwrap_or_else(|| "-".to_owned());
        match label.shape() {
            Shape::Box2d(_) => println!("[{}] {} box {}", idx, class, pixels),
            Shape::Polygon(polygon) => println!(
                "[{}] {} polygon of {} points {}",
                idx,
                class,
                polygon.points.len(),
                pixels
            ),
            Shape::Invalid => println!("[{}] {} invalid: {}", idx, class, label),
        }
    }
    if let Some(file) = dataset.label_file(&image) {
        for line in file.unparsed_lines() {
            println!("unparsed: {}", line);
        }
    }
    Ok(())
}

fn handle_stats(dataset: &Dataset, settings: &Settings, chart: bool) -> Result<(), Error> {
    let stats = DatasetStats::compute(dataset).with_name_width(settings.name_width);
    print!("{}", stats);
    if chart {
        println!();
        print!("{}", stats.bar_chart(settings.chart_width));
    }
    Ok(())
}

fn handle_add_label(
    dataset: &mut Dataset,
    image: String,
    class: String,
    coords: Vec<f64>,
) -> Result<(), Error> {
    let class_id = dataset.resolve_class(&class)?;
    let label = Label::new(class_id, coords);
    if let Shape::Invalid = label.shape() {
        return Err(Error::InvalidLabel(format!(
            "expected 4 coordinates or an even number above 4, got {}",
            label.coords.len()
        )));
    }

    let index = dataset.add_label(&image, label)?;
    println!("Added label [{}] to {}", index, image);
    Ok(())
}

fn handle_delete_label(dataset: &mut Dataset, image: String, index: usize) -> Result<(), Error> {
    let removed = dataset.delete_label(&image, index)?;
    println!("Deleted label [{}] {} from {}", index, removed, image);
    Ok(())
}

fn handle_set_class(
    dataset: &mut Dataset,
    image: String,
    index: usize,
    class: String,
) -> Result<(), Error> {
    let class_id = dataset.resolve_class(&class)?;
    dataset.change_label_class(&image, index, class_id)?;
    println!(
        "Label [{}] of {} is now {}",
        index,
        image,
        dataset.classes()[class_id]
    );
    Ok(())
}

fn handle_rename_class(dataset: &mut Dataset, class: String, new_name: String) -> Result<(), Error> {
    let class_id = dataset.resolve_class(&class)?;
    let old_name = dataset.classes()[class_id].clone();

    match dataset.rename_class(class_id, &new_name)? {
        RenameOutcome::Unchanged => println!("Class {} is already named {}", class_id, old_name),
        RenameOutcome::Renamed { class_id } => {
            println!("Renamed class [{}] {} to {}", class_id, old_name, new_name.trim())
        }
        RenameOutcome::Merged { into, relabeled } => println!(
            "Merged class {} into [{}] {} ({} labels moved)",
            old_name,
            into,
            dataset.classes()[into],
            relabeled
        ),
    }
    Ok(())
}

fn handle_rename_image(dataset: &mut Dataset, image: String, new_name: String) -> Result<(), Error> {
    let renamed = dataset.rename_image(&image, &new_name)?;
    println!("Renamed {} to {}", image, renamed);
    Ok(())
}

fn handle_delete(dataset: &mut Dataset, images: Vec<String>, yes: bool) -> Result<(), Error> {
    if !yes {
        let confirmed = Confirm::new(&format!(
            "Delete {} images and their labels?",
            images.len()
        ))
        .with_default(false)
        .prompt()
        .unwrap_or(false);
        if !confirmed {
            println!("Nothing deleted");
            return Ok(());
        }
    }

    let deleted = dataset.delete_images(&images)?;
    println!("Deleted {} images", deleted);
    Ok(())
}

fn handle_thumbnails(
    dataset: &Dataset,
    settings: &Settings,
    output: PathBuf,
    class: Option<String>,
    size: Option<u32>,
) -> Result<(), Error> {
    let size = size.unwrap_or(settings.thumbnail_size);
    if size == 0 {
        return Err(Error::InvalidParameters(
            "thumbnail size must be positive".to_owned(),
        ));
    }

    let images = match class {
        Some(class) => {
            dataset.images_for_class(dataset.resolve_class(&class)?, SortOrder::Ascending)
        }
        None => dataset.images().iter().map(String::as_str).collect(),
    };

    fs::create_dir_all(&output)?;
    for image in &images {
        let thumb = create_thumbnail(&dataset.image_path(image), size)?;
        thumb.save(output.join(format!("{}.png", image)))?;
    }

    info!("Wrote {} thumbnails to {:?}", images.len(), output);
    println!("Wrote {} thumbnails", images.len());
    Ok(())
}

fn handle_preview(
    dataset: &Dataset,
    settings: &Settings,
    image: String,
    output: PathBuf,
    size: Option<u32>,
) -> Result<(), Error> {
    let size = size.unwrap_or(settings.preview_size);
    if size == 0 {
        return Err(Error::InvalidParameters(
            "preview size must be positive".to_owned(),
        ));
    }

    let labels = dataset
        .labels(&image)
        .ok_or_else(|| Error::UnknownImage(image.clone()))?;
    let preview = render_preview(&dataset.image_path(&image), labels, size)?;
    preview.save(&output)?;
    println!("Wrote preview of {} to {}", image, output.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;
    let mut dataset = load_dataset(&args, &settings).await?;

    match args.cmd {
        Command::Classes { counts } => handle_classes(&dataset, counts),
        Command::Images {
            class,
            filter,
            descending,
        } => handle_images(&dataset, class, filter, descending),
        Command::Show { image } => handle_show(&dataset, image),
        Command::Stats { chart } => handle_stats(&dataset, &settings, chart),
        Command::AddLabel {
            image,
            class,
            coords,
        } => handle_add_label(&mut dataset, image, class, coords),
        Command::DeleteLabel { image, index } => handle_delete_label(&mut dataset, image, index),
        Command::SetClass {
            image,
            index,
            class,
        } => handle_set_class(&mut dataset, image, index, class),
        Command::RenameClass { class, new_name } => {
            handle_rename_class(&mut dataset, class, new_name)
        }
        Command::RenameImage { image, new_name } => {
            handle_rename_image(&mut dataset, image, new_name)
        }
        Command::Delete { images, yes } => handle_delete(&mut dataset, images, yes),
        Command::Thumbnails {
            output,
            class,
            size,
        } => handle_thumbnails(&dataset, &settings, output, class, size),
        Command::Preview {
            image,
            output,
            size,
        } => handle_preview(&dataset, &settings, image, output, size),
    }
}
