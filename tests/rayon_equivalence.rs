#![cfg(feature = "rayon")]

use gatematch::layout::memory::{MemoryLayer, MemoryLayout};
use gatematch::{
    CompileConfig, GateTemplate, LayerType, MatchConfig, MatchProgress, Matcher, OwnedImage,
    TemplateBank, TemplateId,
};

fn make_template(width: usize, height: usize, salt: usize) -> OwnedImage {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 11 + salt) ^ (y * 3) ^ (x * y)) & 0xFF;
            data.push(value as u8);
        }
    }
    OwnedImage::new(data, width, height).unwrap()
}

fn templates() -> Vec<GateTemplate> {
    [(10, 8), (14, 14), (6, 12), (14, 14), (9, 9)]
        .into_iter()
        .enumerate()
        .map(|(i, (w, h))| {
            GateTemplate::from_image(
                TemplateId(i as u32),
                format!("cell{i}"),
                LayerType::Logic,
                make_template(w, h, i * 17),
            )
        })
        .collect()
}

fn layer(templates: &[GateTemplate]) -> MemoryLayer {
    let (width, height) = (96, 64);
    let mut data: Vec<u8> = (0..width * height).map(|i| (i * 7 % 23) as u8).collect();
    for (tpl, (px, py)) in templates.iter().zip([(4, 4), (30, 6), (60, 10), (8, 40), (50, 44)]) {
        let view = tpl.image(LayerType::Logic).unwrap();
        for y in 0..view.height() {
            let row = view.row(y).unwrap();
            data[(py + y) * width + px..][..row.len()].copy_from_slice(row);
        }
    }
    MemoryLayer::new(OwnedImage::new(data, width, height).unwrap())
}

#[test]
fn parallel_preparation_keeps_bank_order() {
    let templates = templates();
    let sequential = TemplateBank::compile(&templates, &CompileConfig::default()).unwrap();
    let parallel = TemplateBank::compile(
        &templates,
        &CompileConfig {
            parallel: true,
            ..CompileConfig::default()
        },
    )
    .unwrap();

    let keys = |bank: &TemplateBank| -> Vec<_> {
        bank.prepared()
            .iter()
            .map(|p| (p.template(), p.orientation()))
            .collect()
    };
    assert_eq!(keys(&sequential), keys(&parallel));
    assert_eq!(sequential.rejected(), parallel.rejected());
}

#[test]
fn parallel_preparation_gives_identical_placements() {
    let templates = templates();
    let layer = layer(&templates);
    let cfg = MatchConfig {
        threshold_hc: 0.5,
        threshold_detection: 0.9,
        max_step: 2,
        ..MatchConfig::default()
    };

    let run = |parallel: bool| {
        let bank = TemplateBank::compile(
            &templates,
            &CompileConfig {
                parallel,
                pyramid_factor: 2,
                ..CompileConfig::default()
            },
        )
        .unwrap();
        let mut layout = MemoryLayout::new();
        let report = Matcher::new(bank)
            .with_config(cfg.clone())
            .run(&layer, &mut layout, layer.bounds(), &MatchProgress::new())
            .unwrap();
        report
            .placed
            .iter()
            .map(|p| (p.rect, p.template, p.orientation, p.score))
            .collect::<Vec<_>>()
    };

    assert_eq!(run(false), run(true));
}
