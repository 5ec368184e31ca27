//! The modifier bundle that parameterizes the next transformation, and the
//! per-column line styling modifiers.
//!
//! Grounded on `original_source/src/modifiers.h`'s field set and
//! `src/color/styled.rs`'s `ColorStyle` for the line-styling half.

use std::collections::BTreeSet;

/// Granularity an operation acts over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Structure {
    Char,
    Word,
    Line,
    Page,
    Mark,
    Search,
    Cursor,
    Buffer,
}

impl Default for Structure {
    fn default() -> Self {
        Structure::Char
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forwards,
    Backwards,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Forwards
    }
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Direction::Forwards => Direction::Backwards,
            Direction::Backwards => Direction::Forwards,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Strength {
    VeryWeak,
    Weak,
    Default,
    Strong,
    VeryStrong,
}

impl Default for Strength {
    fn default() -> Self {
        Strength::Default
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Current,
    LimitCurrent,
    LimitNeighbor,
}

impl Default for Boundary {
    fn default() -> Self {
        Boundary::Current
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionMode {
    Insert,
    Replace,
}

impl Default for InsertionMode {
    fn default() -> Self {
        InsertionMode::Insert
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorsAffected {
    Current,
    All,
}

impl Default for CursorsAffected {
    fn default() -> Self {
        CursorsAffected::Current
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteType {
    DeleteContents,
    PreserveContents,
}

impl Default for DeleteType {
    fn default() -> Self {
        DeleteType::DeleteContents
    }
}

/// The bundle of editing-command parameters. `reset_soft` restores transient
/// fields while keeping sticky ones (`structure`, `direction`); `reset_hard`
/// restores everything to defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modifiers {
    pub structure: Structure,
    pub direction: Direction,
    pub repetitions: usize,
    pub strength: Strength,
    pub boundary_begin: Boundary,
    pub boundary_end: Boundary,
    pub insertion_mode: InsertionMode,
    pub cursors_affected: CursorsAffected,
    pub delete_type: DeleteType,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            structure: Structure::default(),
            direction: Direction::default(),
            repetitions: 1,
            strength: Strength::default(),
            boundary_begin: Boundary::default(),
            boundary_end: Boundary::default(),
            insertion_mode: InsertionMode::default(),
            cursors_affected: CursorsAffected::default(),
            delete_type: DeleteType::default(),
        }
    }
}

impl Modifiers {
    /// Restore transient fields (repetitions, boundaries, insertion mode,
    /// delete type) while preserving sticky structure/direction.
    pub fn reset_soft(&mut self) {
        let structure = self.structure;
        let direction = self.direction;
        *self = Self::default();
        self.structure = structure;
        self.direction = direction;
    }

    pub fn reset_hard(&mut self) {
        *self = Self::default();
    }
}

/// Per-column line styling attribute (distinct from the keyboard `Modifiers`
/// bundle above).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    Bold,
    Underline,
    Italic,
    Reverse,
    Dim,
    Red,
    Green,
    Yellow,
    Blue,
    Cyan,
    Magenta,
}

pub type ModifierSet = BTreeSet<Modifier>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_soft_keeps_structure_and_direction() {
        let mut m = Modifiers {
            structure: Structure::Word,
            direction: Direction::Backwards,
            repetitions: 5,
            ..Modifiers::default()
        };
        m.reset_soft();
        assert_eq!(m.structure, Structure::Word);
        assert_eq!(m.direction, Direction::Backwards);
        assert_eq!(m.repetitions, 1);
    }

    #[test]
    fn reset_hard_clears_everything() {
        let mut m = Modifiers {
            structure: Structure::Word,
            direction: Direction::Backwards,
            repetitions: 5,
            ..Modifiers::default()
        };
        m.reset_hard();
        assert_eq!(m, Modifiers::default());
    }

    #[test]
    fn direction_reverse_is_an_involution() {
        assert_eq!(Direction::Forwards.reverse().reverse(), Direction::Forwards);
    }
}
