/// Edit lifecycle of a draft-backed screen.
///
/// `Viewing -> Editing -> Saving -> Viewing` on success, `Saving -> Editing`
/// on failure, and `Editing -> Viewing` on cancel. Every other transition is
/// refused and leaves the mode unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    Viewing,
    Editing,
    Saving,
}

impl EditMode {
    /// Enters editing from viewing. Already editing is a no-op that keeps the draft.
    pub fn begin_edit(&mut self) -> bool {
        if *self == EditMode::Viewing {
            *self = EditMode::Editing;
            true
        } else {
            false
        }
    }

    pub fn begin_save(&mut self) -> bool {
        if *self == EditMode::Editing {
            *self = EditMode::Saving;
            true
        } else {
            false
        }
    }

    pub fn finish_save(&mut self, succeeded: bool) {
        if *self == EditMode::Saving {
            *self = if succeeded {
                EditMode::Viewing
            } else {
                EditMode::Editing
            };
        }
    }

    pub fn cancel(&mut self) -> bool {
        if *self == EditMode::Editing {
            *self = EditMode::Viewing;
            true
        } else {
            false
        }
    }

    pub fn is_editing(self) -> bool {
        self == EditMode::Editing
    }

    pub fn is_saving(self) -> bool {
        self == EditMode::Saving
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editing_twice_is_a_no_op() {
        let mut mode = EditMode::default();
        assert!(mode.begin_edit());
        assert!(!mode.begin_edit());
        assert_eq!(mode, EditMode::Editing);
    }

    #[test]
    fn failed_save_returns_to_editing() {
        let mut mode = EditMode::Editing;
        assert!(mode.begin_save());
        assert!(!mode.cancel());
        mode.finish_save(false);
        assert_eq!(mode, EditMode::Editing);
        assert!(mode.begin_save());
        mode.finish_save(true);
        assert_eq!(mode, EditMode::Viewing);
    }

    #[test]
    fn save_requires_editing() {
        let mut mode = EditMode::Viewing;
        assert!(!mode.begin_save());
        mode.finish_save(true);
        assert_eq!(mode, EditMode::Viewing);
    }
}
