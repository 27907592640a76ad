//! Layout Engine - width measurement and justified x-positioning of groups
//!
//! Given the groups of one staff, the engine measures each group through the
//! [`GlyphMetrics`] capability and distributes the leftover staff width evenly as
//! padding after every group, clamped to the configured range. Content wider than the
//! staff keeps the minimum padding and overflows to the right.

use super::grouping::{group_width, RenderedEventGroup};
use super::metrics::GlyphMetrics;
use crate::config::LayoutConfig;
use crate::models::events::Event;
use serde::{Deserialize, Serialize};

/// A group with its measured width and assigned position
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct PositionedGroup {
    pub group: RenderedEventGroup,

    /// Left edge
    pub x: f32,

    /// Rendered width of the group's glyphs
    pub width: f32,

    /// Space after the group
    pub padding: f32,
}

/// Slot occupied by clefs re-emitted at the start of a staff
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct LeadingSlot {
    pub x: f32,
    pub width: f32,
    pub padding: f32,
}

/// Positioned groups of one staff
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct StaffLayout {
    pub leading: Option<LeadingSlot>,

    pub groups: Vec<PositionedGroup>,

    /// Sum of glyph widths without padding
    pub required_width: f32,

    /// Sum of width + padding over the leading slot and all groups
    pub total_x_size: f32,
}

impl StaffLayout {
    fn from_parts(leading: Option<LeadingSlot>, groups: Vec<PositionedGroup>) -> Self {
        let lead_width = leading.map_or(0.0, |l| l.width);
        let lead_size = leading.map_or(0.0, |l| l.width + l.padding);
        Self {
            required_width: lead_width + groups.iter().map(|g| g.width).sum::<f32>(),
            total_x_size: lead_size + groups.iter().map(|g| g.width + g.padding).sum::<f32>(),
            leading,
            groups,
        }
    }

    /// Group containing event `index`; `None` if the staff does not hold it
    pub fn group_for_event(&self, index: usize) -> Option<&PositionedGroup> {
        self.groups.iter().find(|g| g.group.contains(index))
    }

    pub fn first_event(&self) -> Option<usize> {
        self.groups.first().map(|g| g.group.first)
    }

    pub fn last_event(&self) -> Option<usize> {
        self.groups.last().map(|g| g.group.last)
    }

    /// Right edge of the last group including its padding
    pub fn end_x(&self, left_margin: f32) -> f32 {
        left_margin + self.total_x_size
    }
}

/// Main layout engine for positioning groups on staves
pub struct LayoutEngine<'a, M: GlyphMetrics + ?Sized> {
    metrics: &'a M,
    config: &'a LayoutConfig,
}

impl<'a, M: GlyphMetrics + ?Sized> LayoutEngine<'a, M> {
    pub fn new(metrics: &'a M, config: &'a LayoutConfig) -> Self {
        Self { metrics, config }
    }

    pub fn config(&self) -> &LayoutConfig {
        self.config
    }

    /// Pair every group with its rendered width
    pub fn measure(&self, events: &[Event], groups: &[RenderedEventGroup]) -> Vec<(RenderedEventGroup, f32)> {
        groups
            .iter()
            .map(|g| (*g, group_width(events, g, self.metrics)))
            .collect()
    }

    /// Padding per slot for `count` slots whose widths sum to `required`
    pub fn justified_padding(&self, required: f32, count: usize, available: f32, is_last: bool) -> f32 {
        if count == 0 {
            return 0.0;
        }
        let raw = (available - required) / count as f32;
        let padding = self.config.clamp_padding(raw);
        if is_last && !self.config.justify_last_staff {
            padding.min(self.config.clamped_default_padding())
        } else {
            padding
        }
    }

    /// Place measured groups left to right with one padding value
    pub fn place(&self, sized: &[(RenderedEventGroup, f32)], padding: f32, start_x: f32) -> Vec<PositionedGroup> {
        let mut x = start_x;
        sized
            .iter()
            .map(|&(group, width)| {
                let positioned = PositionedGroup { group, x, width, padding };
                x += width + padding;
                positioned
            })
            .collect()
    }

    /// Justify one staff. `leading_width` reserves a slot before the first group.
    pub fn layout_staff(
        &self,
        events: &[Event],
        groups: &[RenderedEventGroup],
        leading_width: Option<f32>,
        is_last: bool,
    ) -> StaffLayout {
        let sized = self.measure(events, groups);
        let required: f32 = sized.iter().map(|(_, w)| w).sum::<f32>() + leading_width.unwrap_or(0.0);
        let count = sized.len() + usize::from(leading_width.is_some());
        let padding = self.justified_padding(required, count, self.config.staff_width, is_last);

        let mut x = self.config.left_margin;
        let leading = leading_width.map(|width| {
            let slot = LeadingSlot { x, width, padding };
            x += width + padding;
            slot
        });

        if required > self.config.staff_width {
            log::debug!(
                "staff overflows: required {:.1} > available {:.1}, padding {:.1}",
                required,
                self.config.staff_width,
                padding
            );
        } else {
            log::debug!("staff of {} slots justified with padding {:.1}", count, padding);
        }

        StaffLayout::from_parts(leading, self.place(&sized, padding, x))
    }

    /// Lay out a staff whose first `incipit` groups end at `incipit_target`; the
    /// remainder is justified into what is left of the staff.
    ///
    /// Incipit groups share one padding kept inside the configured bounds. Width
    /// still missing after that goes into the gap after the last incipit group, so the
    /// music after the incipit always starts at `incipit_target`.
    pub fn layout_with_incipit(
        &self,
        events: &[Event],
        groups: &[RenderedEventGroup],
        incipit: usize,
        incipit_target: f32,
    ) -> StaffLayout {
        let sized = self.measure(events, groups);
        let split = incipit.min(sized.len());
        let (head, tail) = sized.split_at(split);

        let head_width: f32 = head.iter().map(|(_, w)| w).sum();
        let mut positioned = match head.split_last() {
            Some((last, rest)) => {
                let spare = incipit_target - head_width;
                let padding = self.config.clamp_padding(spare / head.len() as f32);
                let mut placed = self.place(rest, padding, self.config.left_margin);
                let x = placed.last().map_or(self.config.left_margin, |g| g.x + g.width + g.padding);
                let gap = spare - padding * rest.len() as f32;
                if gap > padding {
                    log::debug!("incipit of {} groups closes with a gap of {:.1}", head.len(), gap);
                }
                placed.push(PositionedGroup {
                    group: last.0,
                    x,
                    width: last.1,
                    padding: gap,
                });
                placed
            }
            None => Vec::new(),
        };

        let tail_width: f32 = tail.iter().map(|(_, w)| w).sum();
        let remaining = self.config.staff_width - incipit_target;
        let tail_padding = self.justified_padding(tail_width, tail.len(), remaining, false);
        positioned.extend(self.place(tail, tail_padding, self.config.left_margin + incipit_target));
        StaffLayout::from_parts(None, positioned)
    }
}
