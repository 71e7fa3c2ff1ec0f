// conv_demo.rs
// Runs one forward/backward pass of a tiny conv -> ReLU -> affine -> softmax
// network on random data and logs tensor summaries.
//
// Usage:
//   conv_demo [config.json]
//
// Without an argument the layer uses 4 filters of 3x3 over 1 channel, pad 1.
// Input planes are at least 6x6, grown until the layer's stride tiles them.
// Set RUST_LOG=debug (or trace) for per-layer detail.

use log::{error, info};
use rust_cnn_layers::config::{load_config, ConvConfig};
use rust_cnn_layers::layers::{Affine, Layer, ReLU, SoftmaxWithLoss};
use rust_cnn_layers::matrix::{Dense, Matrix};
use rust_cnn_layers::tensor::{ImageShape, Images};
use rust_cnn_layers::utils::{argmax, summary, SimpleRng};
use rust_cnn_layers::Result;
use std::env;
use std::process;

// Input geometry.
const BATCH: usize = 2;
const MIN_IMG_SIZE: usize = 6;
const NUM_CLASSES: usize = 3;

fn run(config: &ConvConfig) -> Result<()> {
    let mut rng = SimpleRng::new(config.seed.unwrap_or(42));
    let conv = config.build(&mut rng)?;
    let relu = ReLU::new();

    let (img_h, img_w) = config.fitting_input(MIN_IMG_SIZE);
    let in_shape = ImageShape::new(BATCH, config.in_channels, img_h, img_w);
    let x = Images::new(in_shape, rng.uniform_vec(in_shape.len(), -1.0, 1.0))?;
    info!("input  {}", x);

    let feature_shape = conv.output_shape(in_shape)?;
    let affine = Affine::new_random(feature_shape.item_len(), NUM_CLASSES, &mut rng)?;
    let loss_layer = SoftmaxWithLoss::new();

    // Forward.
    let features = conv.forward(&x)?;
    info!("conv   {}", features);
    let activated = relu.forward(&features.to_dense())?;
    let scores = affine.forward(&activated)?;

    let mut targets = Dense::zeros(BATCH, NUM_CLASSES);
    for b in 0..BATCH {
        targets.set(b, b % NUM_CLASSES, 1.0);
    }
    let loss = loss_layer.forward(&scores, &targets)?;
    info!("loss   {:.6}", loss);
    if let Some(probs) = loss_layer.output() {
        for b in 0..probs.rows() {
            info!("item {} predicted class {:?}", b, argmax(&probs.row(b)));
        }
    }

    // Backward.
    let d_scores = loss_layer.backward()?;
    let d_activated = affine.backward(&d_scores)?;
    let d_features = relu.backward(&d_activated)?;
    let dx = conv.backward(&Images::from_dense(feature_shape, &d_features)?)?;

    info!("dx     {}", dx);
    info!("dW     {}", conv.grad_weights());
    info!("dB     {}", summary(&conv.grad_biases()));
    info!("affine dW {}", summary(&affine.grad_weights()));
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match env::args().nth(1) {
        Some(path) => load_config(&path).unwrap_or_else(|e| {
            error!("could not load {}: {}", path, e);
            process::exit(1);
        }),
        None => {
            let mut cfg = ConvConfig::new(4, 1, 3);
            cfg.pad = 1;
            cfg
        }
    };
    info!("config {:?}", config);

    if let Err(e) = run(&config) {
        error!("{}", e);
        process::exit(1);
    }
}
