//! CLIP vision encoder for image embeddings

use std::path::Path;

use anyhow::{Context, Result};
use ndarray::Array4;
use ort::session::Session;

use crate::config::{EMBEDDING_DIM, INPUT_SIZE, PIXEL_MEAN, PIXEL_STD, VISION_MODEL};
use crate::core::Embedding;
use crate::models::Embedder;
use crate::ui;

pub struct VisionEmbedder {
    session: Session,
}

impl VisionEmbedder {
    /// Load the vision model, resolving its path from configuration
    pub fn new() -> Result<Self> {
        let model_path = crate::config::get_vision_model_path().context(format!(
            "Vision model not found. Ensure {} exists",
            VISION_MODEL
        ))?;

        if !model_path.exists() {
            anyhow::bail!(
                "Vision model file does not exist: {}",
                model_path.display()
            );
        }

        Self::load(&model_path)
    }

    pub fn load(model_path: &Path) -> Result<Self> {
        ui::debug(&format!("Loading vision model: {}", model_path.display()));
        let session = crate::runtime::create_session(model_path)
            .context("Failed to load vision model")?;
        ui::success("Vision model loaded");
        Ok(Self { session })
    }

    pub fn encode(&mut self, image: &image::DynamicImage) -> Result<Embedding> {
        let mut batch = self.encode_batch(std::slice::from_ref(image))?;
        batch.pop().context("Model returned no embedding")
    }

    /// Encode a batch of decoded images in a single session run
    pub fn encode_batch(&mut self, images: &[image::DynamicImage]) -> Result<Vec<Embedding>> {
        if images.is_empty() {
            return Ok(Vec::new());
        }

        let pixels = preprocess(images);
        let input = ort::value::Value::from_array(pixels)?;

        let outputs = self.session.run(ort::inputs!["pixel_values" => input])?;
        extract_embeddings(&outputs, images.len())
    }
}

impl Embedder for VisionEmbedder {
    fn embed_image(&mut self, path: &Path) -> Result<Embedding> {
        let image = image::open(path)
            .with_context(|| format!("Failed to open image: {}", path.display()))?;
        self.encode(&image)
    }

    fn embed_batch(&mut self, paths: &[String]) -> Result<Vec<Embedding>> {
        let images: Vec<image::DynamicImage> = paths
            .iter()
            .map(|p| image::open(p).with_context(|| format!("Failed to open image: {}", p)))
            .collect::<Result<_>>()?;
        self.encode_batch(&images)
    }
}

/// Resize, normalize and stack images into an NCHW batch tensor
fn preprocess(images: &[image::DynamicImage]) -> Array4<f32> {
    use image::imageops::FilterType;

    let size = INPUT_SIZE as usize;
    let mut data = Array4::<f32>::zeros((images.len(), 3, size, size));

    for (n, img) in images.iter().enumerate() {
        let resized = img.resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom);
        let rgb = resized.to_rgb8();

        for y in 0..size {
            for x in 0..size {
                let px = rgb.get_pixel(x as u32, y as u32);
                for c in 0..3 {
                    data[[n, c, y, x]] = (px[c] as f32 / 255.0 - PIXEL_MEAN[c]) / PIXEL_STD[c];
                }
            }
        }
    }

    data
}

fn extract_embeddings(
    outputs: &ort::session::SessionOutputs,
    batch: usize,
) -> Result<Vec<Embedding>> {
    let output = outputs
        .get("image_embeds")
        .or_else(|| outputs.get("pooler_output"))
        .context("Model output not found")?;

    let (shape, data) = output.try_extract_tensor::<f32>()?;
    let dims: Vec<usize> = shape.iter().map(|&x| x as usize).collect();

    match dims.as_slice() {
        [n, dim] if *n == batch && *dim == EMBEDDING_DIM => Ok(data
            .chunks(*dim)
            .map(|row| Embedding::new(row.to_vec()))
            .collect()),
        _ => anyhow::bail!("Unexpected output shape: {:?}", dims),
    }
}
