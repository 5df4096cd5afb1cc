//! Panel placement: which corner each physical panel occupies
//!
//! Panels are placed by their handedness and whether they are mounted
//! upside-down. The layout keeps the derived grid geometry current and
//! knows how to cycle through every valid arrangement of the attached set.

use tracing::{debug, info};

use crate::compositor::{self, Corner, GridGeometry, Side, SIDE_COLUMNS};
use crate::error::DriverError;

/// One physical panel unit (or a bridged pair reporting as one)
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub index: usize,
    /// Device name, used to break corner ties
    pub name: String,
    pub columns: u32,
    pub handedness: Side,
    pub flipped: bool,
}

impl Panel {
    pub fn new(name: impl Into<String>, handedness: Side, columns: u32) -> Self {
        Self {
            index: 0,
            name: name.into(),
            columns,
            handedness,
            flipped: false,
        }
    }

    /// Two units joined over their own wireless link report as one wide panel
    pub fn is_bridged(&self) -> bool {
        self.columns > SIDE_COLUMNS
    }

    pub fn sides(&self) -> Vec<Side> {
        if self.is_bridged() {
            vec![Side::Left, Side::Right]
        } else {
            vec![self.handedness]
        }
    }

    /// The second report range of a bridged panel belongs to its right half
    pub fn secondary_side(&self) -> Option<Side> {
        self.is_bridged().then_some(Side::Right)
    }

    pub fn primary_side(&self) -> Side {
        self.sides()[0]
    }

    pub fn corner(&self, side: Side) -> Corner {
        Corner::for_side(side, self.flipped)
    }

    pub fn corners(&self) -> Vec<Corner> {
        self.sides().into_iter().map(|s| self.corner(s)).collect()
    }
}

/// A `(panel index, side)` pair: one addressable panel half
pub type SideId = (usize, Side);

/// All attached panels plus the grid they form
#[derive(Debug, Clone)]
pub struct PanelLayout {
    panels: Vec<Panel>,
    geometry: GridGeometry,
}

impl PanelLayout {
    /// Place `panels` in order. A panel that would land on an occupied
    /// corner causes whichever of the two has the greater name to be flipped.
    pub fn new(panels: Vec<Panel>) -> Result<Self, DriverError> {
        if panels.is_empty() {
            return Err(DriverError::NoPanels);
        }

        let mut placed: Vec<Panel> = Vec::with_capacity(panels.len());
        for (index, mut panel) in panels.into_iter().enumerate() {
            panel.index = index;
            panel.flipped = false;
            for side in panel.sides() {
                let unflipped = Corner::for_side(side, false);
                for other in placed.iter_mut() {
                    let clash = other.corners().contains(&unflipped);
                    if clash && !panel.flipped {
                        if panel.name < other.name {
                            debug!("{} takes {} from {}", panel.name, unflipped, other.name);
                            other.flipped = true;
                        } else {
                            debug!("{} flipped, {} already at {}", panel.name, other.name, unflipped);
                            panel.flipped = true;
                        }
                    }
                }
            }
            placed.push(panel);
        }

        let mut layout = Self {
            panels: placed,
            geometry: GridGeometry::from_corners(&[]),
        };
        layout.update_geometry();
        Ok(layout)
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn panel(&self, index: usize) -> Option<&Panel> {
        self.panels.get(index)
    }

    pub fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    /// Occupied corners, panel by panel
    pub fn corners(&self) -> Vec<Corner> {
        self.panels.iter().flat_map(Panel::corners).collect()
    }

    pub fn corner_of(&self, (index, side): SideId) -> Option<Corner> {
        self.panels.get(index).map(|p| p.corner(side))
    }

    /// Firmware one-handed mode applies while the grid is a single panel wide
    pub fn is_single_width(&self) -> bool {
        self.geometry.num_cols == SIDE_COLUMNS
    }

    /// Every panel half, in panel order
    pub fn side_ids(&self) -> Vec<SideId> {
        self.panels
            .iter()
            .flat_map(|p| p.sides().into_iter().map(move |s| (p.index, s)))
            .collect()
    }

    /// Put one panel half at its bottom (`false`) or top (`true`) corner.
    ///
    /// A bridged panel moves both halves. Any other panel already on one of
    /// the new corners is moved the opposite way.
    pub fn flip_panel(&mut self, (index, side): SideId, flipped: bool) -> Result<(), DriverError> {
        let panel = self
            .panels
            .get_mut(index)
            .ok_or(DriverError::UnknownPanel(index))?;
        panel.flipped = flipped;
        let new_corners = panel.corners();
        info!("Panel {} {:?} moved to {}", index, side, panel.corner(side));

        for other in self.panels.iter_mut().filter(|p| p.index != index) {
            if let Some(taken) = other.corners().into_iter().find(|c| new_corners.contains(c)) {
                other.flipped = !flipped;
                debug!("Panel {} moved out of {}", other.index, taken);
            }
        }

        self.update_geometry();
        Ok(())
    }

    /// Corner sets the attached sides may form
    pub fn valid_forms(&self) -> Vec<Vec<Corner>> {
        let ids = self.side_ids();
        let lefts = ids.iter().filter(|(_, s)| *s == Side::Left).count();
        let rights = ids.len() - lefts;

        use Corner::*;
        let mut forms = if lefts >= 2 && rights >= 2 {
            vec![vec![BottomLeft, BottomRight, TopLeft, TopRight]]
        } else if lefts >= 1 && rights >= 1 {
            vec![vec![BottomLeft, BottomRight], vec![BottomLeft, TopLeft]]
        } else if lefts >= 1 {
            vec![vec![BottomLeft]]
        } else {
            vec![vec![BottomRight]]
        };
        forms.iter_mut().for_each(|f| f.sort());
        forms
    }

    /// Flip assignments (one per entry of [`side_ids`](Self::side_ids))
    /// that produce a valid form.
    ///
    /// Candidates are ordered with `true` first and the first side varying
    /// slowest. A bridged panel cannot have its halves on different rows.
    pub fn layout_options(&self) -> Vec<Vec<bool>> {
        let ids = self.side_ids();
        let forms = self.valid_forms();
        let n = ids.len();
        let mut options = Vec::new();

        for combo in 0..(1u32 << n) {
            let flips: Vec<bool> = (0..n).map(|j| (combo >> (n - 1 - j)) & 1 == 0).collect();

            let split_bridge = ids.iter().zip(&flips).any(|((idx, _), f)| {
                ids.iter()
                    .zip(&flips)
                    .any(|((other, _), g)| other == idx && g != f)
            });
            if split_bridge {
                continue;
            }

            let mut form: Vec<Corner> = ids
                .iter()
                .zip(&flips)
                .map(|((_, side), f)| Corner::for_side(*side, *f))
                .collect();
            form.sort();
            form.dedup();
            if forms.contains(&form) {
                options.push(flips);
            }
        }
        options
    }

    /// Current flip of every panel half
    pub fn current_flips(&self) -> Vec<bool> {
        self.side_ids()
            .iter()
            .map(|(idx, _)| self.panels[*idx].flipped)
            .collect()
    }

    /// Move to the next valid arrangement, wrapping around. An arrangement
    /// not in the list restarts from the first option.
    pub fn cycle_positions(&mut self) {
        let options = self.layout_options();
        let Some(first) = options.first() else {
            return;
        };
        let current = self.current_flips();
        let next = match options.iter().position(|o| *o == current) {
            Some(i) if i + 1 < options.len() => &options[i + 1],
            _ => first,
        };

        for ((idx, _), flipped) in self.side_ids().into_iter().zip(next.clone()) {
            self.panels[idx].flipped = flipped;
        }
        info!("Cycled layout to {:?}", self.corners());
        self.update_geometry();
    }

    /// Split logical cells into one buffer per panel
    pub fn compose(&self, cells: &[u8]) -> Vec<Vec<u8>> {
        let corners: Vec<Vec<Corner>> = self.panels.iter().map(Panel::corners).collect();
        compositor::compose(cells, &self.geometry, &corners)
    }

    fn update_geometry(&mut self) {
        self.geometry = GridGeometry::from_corners(&self.corners());
        debug!(
            "Grid {}x{} offset ({}, {})",
            self.geometry.num_cols,
            self.geometry.num_rows,
            self.geometry.offset_cols,
            self.geometry.offset_rows
        );
    }
}
