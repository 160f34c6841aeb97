//! Prepared (template, orientation) pairs in processing order.
//!
//! Every pair is prepared once per bank: the template is oriented, down-sampled
//! by the pyramid factor and turned into a zero-mean plan at both resolutions.
//! Pairs are ordered largest template area first, ties kept in input order,
//! and orientations follow the configured orientation list. That order decides
//! which template claims an area first, so it is the same with or without the
//! `rayon` feature.

use crate::image::pyramid::downsample_u8;
use crate::template::{orient_u8, GateTemplate, LayerType, Orientation, TemplateId, TemplatePlan};
use crate::trace::trace_event;
use crate::util::{GateMatchError, GateMatchResult};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Configuration for preparing template assets.
#[derive(Clone, Debug)]
pub struct CompileConfig {
    /// Layer whose template rasters are matched.
    pub layer: LayerType,
    /// Orientations to try for each template, in order.
    pub orientations: Vec<Orientation>,
    /// Integer factor between native and coarse resolution.
    pub pyramid_factor: usize,
    /// Prepare pairs on the rayon pool (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            layer: LayerType::Logic,
            orientations: Orientation::ALL.to_vec(),
            pyramid_factor: 1,
            parallel: false,
        }
    }
}

/// One template in one orientation, ready for scoring.
#[derive(Clone, Debug)]
pub struct PreparedTemplate {
    template: TemplateId,
    orientation: Orientation,
    native: TemplatePlan,
    scaled: TemplatePlan,
}

impl PreparedTemplate {
    /// Orients, down-samples and normalizes `template`'s raster for `layer`.
    pub fn prepare(
        template: &GateTemplate,
        layer: LayerType,
        orientation: Orientation,
        factor: usize,
    ) -> GateMatchResult<Self> {
        if factor == 0 {
            return Err(GateMatchError::InvalidFactor { factor });
        }
        if template.width() == 0 || template.height() == 0 {
            return Err(GateMatchError::InvalidDimensions {
                width: template.width(),
                height: template.height(),
            });
        }
        let raster = template
            .image(layer)
            .ok_or(GateMatchError::MissingLayerImage {
                template: template.id(),
                layer,
            })?;

        let oriented = orient_u8(raster, orientation)?;
        let scaled_img = downsample_u8(oriented.view(), factor).map_err(|err| match err {
            GateMatchError::InvalidDimensions { .. } => GateMatchError::DegenerateTemplate {
                reason: "smaller than the pyramid factor",
            },
            other => other,
        })?;
        let native = TemplatePlan::from_view(oriented.view())?;
        let scaled = TemplatePlan::from_view(scaled_img.view())?;

        Ok(Self {
            template: template.id(),
            orientation,
            native,
            scaled,
        })
    }

    pub fn template(&self) -> TemplateId {
        self.template
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Full-resolution plan used for hill climbing and placement.
    pub fn native(&self) -> &TemplatePlan {
        &self.native
    }

    /// Down-sampled plan used for the coarse scan.
    pub fn scaled(&self) -> &TemplatePlan {
        &self.scaled
    }

    pub fn width(&self) -> usize {
        self.native.width()
    }

    pub fn height(&self) -> usize {
        self.native.height()
    }
}

/// A (template, orientation) pair that could not be prepared.
#[derive(Clone, Debug, PartialEq)]
pub struct RejectedTemplate {
    pub template: TemplateId,
    pub orientation: Orientation,
    pub error: GateMatchError,
}

/// Prepared pairs plus the pairs rejected during preparation.
#[derive(Clone, Debug)]
pub struct TemplateBank {
    prepared: Vec<PreparedTemplate>,
    rejected: Vec<RejectedTemplate>,
    layer: LayerType,
    factor: usize,
}

impl TemplateBank {
    /// Prepares every (template, orientation) pair in processing order.
    pub fn compile(templates: &[GateTemplate], cfg: &CompileConfig) -> GateMatchResult<Self> {
        if cfg.pyramid_factor == 0 {
            return Err(GateMatchError::InvalidFactor {
                factor: cfg.pyramid_factor,
            });
        }
        if cfg.orientations.is_empty() {
            return Err(GateMatchError::InvalidConfig("no orientations to match"));
        }

        let pairs: Vec<(&GateTemplate, Orientation)> = processing_order(templates)
            .into_iter()
            .flat_map(|idx| {
                cfg.orientations
                    .iter()
                    .map(move |&orientation| (&templates[idx], orientation))
            })
            .collect();

        let prepare = |(tpl, orientation): &(&GateTemplate, Orientation)| {
            PreparedTemplate::prepare(tpl, cfg.layer, *orientation, cfg.pyramid_factor).map_err(
                |error| RejectedTemplate {
                    template: tpl.id(),
                    orientation: *orientation,
                    error,
                },
            )
        };

        #[cfg(feature = "rayon")]
        let results: Vec<_> = if cfg.parallel {
            pairs.par_iter().map(prepare).collect()
        } else {
            pairs.iter().map(prepare).collect()
        };
        #[cfg(not(feature = "rayon"))]
        let results: Vec<_> = pairs.iter().map(prepare).collect();

        let mut prepared = Vec::with_capacity(results.len());
        let mut rejected = Vec::new();
        for result in results {
            match result {
                Ok(pair) => prepared.push(pair),
                Err(reject) => {
                    trace_event!(
                        "template_rejected",
                        template = reject.template.0,
                        orientation = format!("{:?}", reject.orientation),
                        error = reject.error.to_string()
                    );
                    rejected.push(reject);
                }
            }
        }

        Ok(Self {
            prepared,
            rejected,
            layer: cfg.layer,
            factor: cfg.pyramid_factor,
        })
    }

    /// Prepared pairs in the order they are scanned.
    pub fn prepared(&self) -> &[PreparedTemplate] {
        &self.prepared
    }

    /// Pairs that failed preparation.
    pub fn rejected(&self) -> &[RejectedTemplate] {
        &self.rejected
    }

    /// Layer type the bank was prepared for.
    pub fn layer(&self) -> LayerType {
        self.layer
    }

    /// Pyramid factor shared by all prepared pairs.
    pub fn factor(&self) -> usize {
        self.factor
    }

    pub fn len(&self) -> usize {
        self.prepared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prepared.is_empty()
    }
}

/// Indices of `templates` sorted by descending area; equal areas keep input order.
pub fn processing_order(templates: &[GateTemplate]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..templates.len()).collect();
    order.sort_by_key(|&idx| std::cmp::Reverse(templates[idx].area()));
    order
}

#[cfg(test)]
mod tests {
    use super::{processing_order, CompileConfig, PreparedTemplate, TemplateBank};
    use crate::image::OwnedImage;
    use crate::template::{GateTemplate, LayerType, Orientation, TemplateId};
    use crate::util::GateMatchError;

    fn ramp(id: u32, width: usize, height: usize) -> GateTemplate {
        let data = (0..width * height).map(|v| (v * 7 % 251) as u8).collect();
        let img = OwnedImage::new(data, width, height).unwrap();
        GateTemplate::from_image(TemplateId(id), format!("t{id}"), LayerType::Logic, img)
    }

    #[test]
    fn order_is_largest_area_first_and_stable() {
        let templates = vec![ramp(0, 4, 4), ramp(1, 8, 8), ramp(2, 2, 8), ramp(3, 8, 8)];
        assert_eq!(processing_order(&templates), vec![1, 3, 0, 2]);
    }

    #[test]
    fn bank_keeps_orientation_order_within_template() {
        let templates = vec![ramp(0, 4, 4), ramp(1, 6, 6)];
        let cfg = CompileConfig {
            orientations: vec![Orientation::FlipBoth, Orientation::Identity],
            ..CompileConfig::default()
        };
        let bank = TemplateBank::compile(&templates, &cfg).unwrap();
        let keys: Vec<_> = bank
            .prepared()
            .iter()
            .map(|p| (p.template().0, p.orientation()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (1, Orientation::FlipBoth),
                (1, Orientation::Identity),
                (0, Orientation::FlipBoth),
                (0, Orientation::Identity),
            ]
        );
    }

    #[test]
    fn flat_and_missing_templates_are_rejected_without_aborting() {
        let flat = GateTemplate::from_image(
            TemplateId(7),
            "flat",
            LayerType::Logic,
            OwnedImage::new(vec![40u8; 16], 4, 4).unwrap(),
        );
        let other_layer = GateTemplate::from_image(
            TemplateId(8),
            "metal-only",
            LayerType::Metal,
            OwnedImage::new((0u8..16).collect(), 4, 4).unwrap(),
        );
        let empty = GateTemplate::new(TemplateId(9), "empty", 0, 3);
        let templates = vec![flat, other_layer, empty, ramp(1, 5, 5)];
        let cfg = CompileConfig {
            orientations: vec![Orientation::Identity],
            ..CompileConfig::default()
        };
        let bank = TemplateBank::compile(&templates, &cfg).unwrap();
        assert_eq!(bank.len(), 1);
        assert_eq!(bank.rejected().len(), 3);
        let errors: Vec<_> = bank.rejected().iter().map(|r| r.error.clone()).collect();
        assert!(errors.contains(&GateMatchError::DegenerateTemplate {
            reason: "zero variance"
        }));
        assert!(errors.contains(&GateMatchError::MissingLayerImage {
            template: TemplateId(8),
            layer: LayerType::Logic,
        }));
        assert!(errors.contains(&GateMatchError::InvalidDimensions {
            width: 0,
            height: 3
        }));
    }

    #[test]
    fn scaled_plan_uses_pyramid_factor() {
        let tpl = ramp(0, 9, 6);
        let prepared = PreparedTemplate::prepare(&tpl, LayerType::Logic, Orientation::Identity, 2)
            .unwrap();
        assert_eq!((prepared.width(), prepared.height()), (9, 6));
        assert_eq!(
            (prepared.scaled().width(), prepared.scaled().height()),
            (4, 3)
        );
    }

    #[test]
    fn template_smaller_than_factor_is_degenerate() {
        let tpl = ramp(0, 3, 3);
        let err = PreparedTemplate::prepare(&tpl, LayerType::Logic, Orientation::Identity, 4)
            .err()
            .unwrap();
        assert!(matches!(err, GateMatchError::DegenerateTemplate { .. }));
    }
}
