//! Condition catalog
//!
//! The experiment crosses three difficulty axes (jump power, obstacle spacing,
//! gap height). Every participant plays the full cross product in a fixed
//! order, so a condition index is a reproducible protocol position.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// One experimental treatment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Axis-index identifier, e.g. `j1_g0_h1`
    pub name: String,
    /// Upward velocity applied by a jump
    pub jump_power: f32,
    /// Horizontal spacing between consecutive obstacles
    pub pipe_distance: i32,
    /// Vertical height of the passable gap
    pub hole_size: i32,
}

/// Levels of each difficulty axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionLevels {
    pub jump_power: Vec<f32>,
    pub pipe_distance: Vec<i32>,
    pub hole_size: Vec<i32>,
}

impl Default for ConditionLevels {
    fn default() -> Self {
        Self {
            jump_power: JUMP_LEVELS.to_vec(),
            pipe_distance: PIPE_DISTANCE_LEVELS.to_vec(),
            hole_size: HOLE_SIZE_LEVELS.to_vec(),
        }
    }
}

impl ConditionLevels {
    /// Number of conditions in the cross product
    pub fn len(&self) -> usize {
        self.jump_power.len() * self.pipe_distance.len() * self.hole_size.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cartesian product of the axes.
    ///
    /// Outer loop is jump power, then spacing, then gap height.
    pub fn catalog(&self) -> Vec<Condition> {
        let mut out = Vec::with_capacity(self.len());
        for (j, &jump_power) in self.jump_power.iter().enumerate() {
            for (g, &pipe_distance) in self.pipe_distance.iter().enumerate() {
                for (h, &hole_size) in self.hole_size.iter().enumerate() {
                    out.push(Condition {
                        name: format!("j{j}_g{g}_h{h}"),
                        jump_power,
                        pipe_distance,
                        hole_size,
                    });
                }
            }
        }
        out
    }
}

/// The standard 3x2x2 catalog
pub fn conditions() -> Vec<Condition> {
    ConditionLevels::default().catalog()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_has_twelve_conditions() {
        let catalog = conditions();
        assert_eq!(catalog.len(), 12);
        assert_eq!(ConditionLevels::default().len(), 12);
    }

    #[test]
    fn test_catalog_order_is_jump_then_spacing_then_hole() {
        let catalog = conditions();
        let names: Vec<_> = catalog.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            &names[..5],
            &["j0_g0_h0", "j0_g0_h1", "j0_g1_h0", "j0_g1_h1", "j1_g0_h0"]
        );
        assert_eq!(names[11], "j2_g1_h1");

        assert_eq!(catalog[0].jump_power, 8.0);
        assert_eq!(catalog[0].pipe_distance, 220);
        assert_eq!(catalog[0].hole_size, 160);

        assert_eq!(catalog[7].name, "j1_g1_h1");
        assert_eq!(catalog[7].jump_power, 10.0);
        assert_eq!(catalog[7].pipe_distance, 260);
        assert_eq!(catalog[7].hole_size, 200);
    }

    #[test]
    fn test_catalog_is_stable_and_names_unique() {
        let a = conditions();
        let b = conditions();
        assert_eq!(a, b);

        let mut names: Vec<_> = a.iter().map(|c| c.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), a.len());
    }

    #[test]
    fn test_empty_axis_yields_empty_catalog() {
        let levels = ConditionLevels {
            hole_size: Vec::new(),
            ..Default::default()
        };
        assert!(levels.is_empty());
        assert!(levels.catalog().is_empty());
    }
}
