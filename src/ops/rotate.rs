use std::collections::BTreeMap;
use std::path::Path;

use lopdf::Document;
use tracing::info;

use crate::config::job::{RotateDirection, RotateJob};
use crate::error::PdfMantraError;
use crate::output::ProcessResult;
use crate::pdf::reader::{normalize_rotation, page_rotation};
use crate::pdf::writer;

/// Which pages to turn and by how much.
#[derive(Debug, Clone, Default)]
pub struct RotationPlan {
    /// 1-based pages the direction applies to; `None` means every page.
    pub pages: Option<Vec<u32>>,
    pub direction: Option<RotateDirection>,
    pub turns: u32,
    /// Absolute angle per 1-based page, applied after the direction.
    pub angles: BTreeMap<u32, i64>,
}

impl From<&RotateJob> for RotationPlan {
    fn from(job: &RotateJob) -> Self {
        Self {
            pages: job.pages.clone(),
            direction: job.direction,
            turns: job.turns,
            angles: job.angles.clone(),
        }
    }
}

/// Compute the new rotation of every page from the current ones.
///
/// `current[i]` is the rotation of page `i + 1`. Results are normalised into 0..360.
pub fn plan_rotations(current: &[i64], plan: &RotationPlan) -> crate::error::Result<Vec<i64>> {
    if plan.direction.is_none() && plan.angles.is_empty() {
        return Err(PdfMantraError::invalid_input(
            "rotate needs a direction or per-page angles",
        ));
    }
    let page_count = current.len() as u32;
    let out_of_range = |page: u32| {
        PdfMantraError::page_range(format!(
            "page {page} is out of range (document has {page_count} pages)"
        ))
    };

    let mut result: Vec<i64> = current.iter().map(|&r| normalize_rotation(r)).collect();

    if let Some(direction) = plan.direction {
        let delta = direction.delta() * i64::from(plan.turns);
        let targets: Vec<u32> = match &plan.pages {
            Some(pages) => pages.clone(),
            None => (1..=page_count).collect(),
        };
        for page in targets {
            let slot = result
                .get_mut(page.wrapping_sub(1) as usize)
                .ok_or_else(|| out_of_range(page))?;
            *slot = normalize_rotation(*slot + delta);
        }
    }

    for (&page, &angle) in &plan.angles {
        if angle % 90 != 0 {
            return Err(PdfMantraError::invalid_input(format!(
                "rotation for page {page} must be a multiple of 90, got {angle}"
            )));
        }
        let slot = result
            .get_mut(page.wrapping_sub(1) as usize)
            .ok_or_else(|| out_of_range(page))?;
        *slot = normalize_rotation(angle);
    }

    Ok(result)
}

/// Apply `plan` to `doc`, returning the new rotation of every page.
pub fn rotate_document(doc: &mut Document, plan: &RotationPlan) -> crate::error::Result<Vec<i64>> {
    let page_ids: Vec<_> = doc.get_pages().into_values().collect();
    let current: Vec<i64> = page_ids.iter().map(|&id| page_rotation(doc, id)).collect();
    let rotations = plan_rotations(&current, plan)?;

    for (&page_id, &rotation) in page_ids.iter().zip(&rotations) {
        doc.get_dictionary_mut(page_id)?.set("Rotate", rotation);
    }
    Ok(rotations)
}

pub fn rotate(
    input: &Path,
    output: &Path,
    plan: &RotationPlan,
) -> crate::error::Result<(ProcessResult, Vec<i64>)> {
    let mut doc = super::load_document(input)?;
    let rotations = rotate_document(&mut doc, plan)?;
    let size = writer::save_to_file(&mut doc, output)?;
    info!(pages = rotations.len(), "saved rotated document");
    Ok((ProcessResult::new(output, size), rotations))
}
