// src/screener/chips.rs
use crate::screener::registry::SignalType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipAction {
    Toggle,
    Remove,
}

/// Which chip, if any, has its toggle/remove menu open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChipMenus {
    open: Option<SignalType>,
}

impl ChipMenus {
    pub fn is_open(&self, signal_type: &SignalType) -> bool {
        self.open.as_ref() == Some(signal_type)
    }

    pub fn open_menu(&self) -> Option<&SignalType> {
        self.open.as_ref()
    }

    /// Clicking a chip opens its menu, or closes it if it was already open.
    /// Every menu pops up in the same spot, so opening one replaces another.
    pub fn click(&mut self, signal_type: &SignalType) {
        if self.is_open(signal_type) {
            self.open = None;
        } else {
            self.open = Some(signal_type.clone());
        }
    }

    pub fn click_outside(&mut self) {
        self.open = None;
    }

    /// Consumes the open menu, returning the chip the action applies to.
    pub fn choose(&mut self, action: ChipAction) -> Option<(SignalType, ChipAction)> {
        self.open.take().map(|t| (t, action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clicking_twice_closes_the_menu() {
        let mut menus = ChipMenus::default();
        let t = SignalType::new("DİP AL");
        menus.click(&t);
        assert!(menus.is_open(&t));
        menus.click(&t);
        assert_eq!(menus.open_menu(), None);
    }

    #[test]
    fn choosing_closes_and_reports_target() {
        let mut menus = ChipMenus::default();
        let t = SignalType::new("ALTIN KIRILIM");
        menus.click(&t);
        assert_eq!(menus.choose(ChipAction::Remove), Some((t, ChipAction::Remove)));
        assert_eq!(menus.choose(ChipAction::Toggle), None);
    }

    #[test]
    fn click_outside_closes_whatever_is_open() {
        let mut menus = ChipMenus::default();
        menus.click(&SignalType::new("PULLBACK AL"));
        menus.click(&SignalType::new("KURUMSAL DİP"));
        assert!(menus.is_open(&SignalType::new("KURUMSAL DİP")));
        menus.click_outside();
        assert_eq!(menus.open_menu(), None);
    }
}
