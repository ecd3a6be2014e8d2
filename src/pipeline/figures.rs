//! Figure extraction and page redaction

use std::collections::btree_map::{BTreeMap, Entry};

use super::{emit, BoxKind, ExtractRequest, ImageRole, ImageSender, PipelineError, RenderedImage};
use crate::config::RenderConfig;
use crate::document::{rasterize, PdfDocument, PdfEngine};
use crate::geometry::{map_box, BoundingBox, CoordinateSpace, PageSize, Rect};
use crate::raster::{extract, pad_border, redact, FillColor};

/// Every mapped box of one page
#[derive(Debug)]
pub(crate) struct PagePlan {
    size: PageSize,
    figures: Vec<PlannedFigure>,
    redactions: Vec<Rect>,
}

#[derive(Debug)]
struct PlannedFigure {
    /// Position in the request's figure list
    index: usize,
    figure: Rect,
    caption: Option<Rect>,
}

fn page_plan<'a>(
    plans: &'a mut BTreeMap<usize, PagePlan>,
    doc: &dyn PdfDocument,
    page: usize,
) -> Result<&'a mut PagePlan, PipelineError> {
    let page_count = doc.page_count();
    if page >= page_count {
        return Err(PipelineError::PageNotFound { page, page_count });
    }

    match plans.entry(page) {
        Entry::Occupied(entry) => Ok(entry.into_mut()),
        Entry::Vacant(entry) => {
            let size = doc.page_size(page)?;
            Ok(entry.insert(PagePlan {
                size,
                figures: Vec::new(),
                redactions: Vec::new(),
            }))
        }
    }
}

fn map_region(
    bbox: &BoundingBox,
    size: PageSize,
    space: CoordinateSpace,
    page: usize,
    index: usize,
    kind: BoxKind,
) -> Result<Rect, PipelineError> {
    map_box(bbox, size, space).map_err(|source| PipelineError::InvalidRegion {
        page,
        index,
        kind,
        source,
    })
}

/// Validate and map every box of the request, grouped by page
pub(crate) fn plan(
    doc: &dyn PdfDocument,
    request: &ExtractRequest,
) -> Result<BTreeMap<usize, PagePlan>, PipelineError> {
    let mut plans = BTreeMap::new();
    let space = request.space;

    for (index, figure) in request.figures.iter().enumerate() {
        let plan = page_plan(&mut plans, doc, figure.page)?;
        let rect = map_region(&figure.bbox, plan.size, space, figure.page, index, BoxKind::Figure)?;
        let caption = figure
            .caption
            .as_ref()
            .map(|c| map_region(c, plan.size, space, figure.page, index, BoxKind::Caption))
            .transpose()?;
        plan.figures.push(PlannedFigure {
            index,
            figure: rect,
            caption,
        });
    }

    for (index, redaction) in request.redactions.iter().enumerate() {
        let plan = page_plan(&mut plans, doc, redaction.page)?;
        let rect = map_region(
            &redaction.bbox,
            plan.size,
            space,
            redaction.page,
            index,
            BoxKind::Redaction,
        )?;
        plan.redactions.push(rect);
    }

    Ok(plans)
}

/// Render each page with boxes once, then crop its figures and redact it
pub(crate) fn render_figures(
    engine: &dyn PdfEngine,
    data: &[u8],
    request: &ExtractRequest,
    settings: &RenderConfig,
    tx: &ImageSender,
) -> Result<(), PipelineError> {
    let doc = engine.open(data)?;
    let plans = plan(doc.as_ref(), request)?;
    let scale = settings.scale();

    for (page, plan) in plans {
        let rendered = rasterize(doc.as_ref(), page, scale)?;
        let to_pixels = |rect: &Rect| rect.to_pixels(scale, rendered.width(), rendered.height());
        let covering =
            |rect: &Rect| rect.covering_pixels(scale, rendered.width(), rendered.height());

        tracing::debug!(
            page,
            figures = plan.figures.len(),
            redactions = plan.redactions.len(),
            "Processing page"
        );

        let mut blanked = Vec::with_capacity(plan.figures.len() * 2 + plan.redactions.len());
        for figure in &plan.figures {
            let region = to_pixels(&figure.figure);
            blanked.push(covering(&figure.figure));
            let image = pad_border(
                &extract(&rendered, region),
                settings.figure_padding,
                FillColor::WHITE.0,
            );
            emit(
                tx,
                RenderedImage {
                    page,
                    role: ImageRole::Figure(figure.index),
                    image,
                },
            )?;

            if let Some(caption) = &figure.caption {
                let region = to_pixels(caption);
                blanked.push(covering(caption));
                let image = pad_border(
                    &extract(&rendered, region),
                    settings.figure_padding,
                    FillColor::WHITE.0,
                );
                emit(
                    tx,
                    RenderedImage {
                        page,
                        role: ImageRole::Caption(figure.index),
                        image,
                    },
                )?;
            }
        }
        blanked.extend(plan.redactions.iter().map(covering));

        let image = redact(&rendered, &blanked, settings.fill);
        emit(
            tx,
            RenderedImage {
                page,
                role: ImageRole::Redacted,
                image,
            },
        )?;
    }

    Ok(())
}
