use anyhow::{Context, Result};
use mapnik::{Map, Runtime};

use crate::job::{Output, RenderJob, Stylesheet};

/// Run one job against an initialized runtime
pub fn render(runtime: &Runtime, job: &RenderJob) -> Result<()> {
    let mut map = Map::new(runtime, job.width, job.height).context("Failed to create map")?;

    match &job.stylesheet {
        Stylesheet::File(path) => map
            .load(path)
            .with_context(|| format!("Failed to load stylesheet {}", path.display()))?,
        Stylesheet::Inline(xml) => map.load_string(xml).context("Failed to load inline stylesheet")?,
    }

    if let Some(srs) = &job.srs {
        map.set_srs(srs).with_context(|| format!("Invalid srs {srs:?}"))?;
    }
    map.set_buffer_size(job.buffer_size);

    match &job.bbox {
        Some(bbox) => map.zoom_to_box(bbox),
        None => map.zoom_all().context("Failed to zoom to layer extents")?,
    }

    if let Some(name) = &job.active_layer {
        if !map.set_active_layer(name) {
            log::warn!("No layer named {:?}; available: {:?}", name, map.layer_names());
        }
    }

    let path = job.output.path();
    match &job.output {
        Output::File { .. } => {
            map.render_to_file(path)
                .with_context(|| format!("Failed to render {}", path.display()))?;
        }
        Output::Png { .. } => {
            let bytes = map.render_to_memory_png().context("Failed to render PNG")?;
            let decoded = image::load_from_memory(&bytes).context("Engine returned an unreadable PNG")?;
            log::debug!("PNG is {}x{}", decoded.width(), decoded.height());
            std::fs::write(path, &bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        }
        Output::UtfGrid {
            layer, key, resolution, ..
        } => {
            let json = map
                .render_to_memory_utf_grid(layer, key, *resolution)
                .with_context(|| format!("Failed to render grid for layer {layer:?}"))?;
            std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        }
    }

    log::info!("Wrote {}", path.display());
    map.free();
    Ok(())
}
