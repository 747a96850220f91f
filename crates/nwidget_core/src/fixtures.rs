//! Widgets shared by the unit tests

use crate::property;

#[derive(Debug, Default)]
pub struct Slider {
    value: i32,
    maximum: i32,
}

impl Slider {
    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn set_value(&mut self, value: i32) -> bool {
        let changed = self.value != value;
        self.value = value;
        changed
    }

    pub fn reset_value(&mut self) -> bool {
        self.set_value(0)
    }

    pub fn maximum(&self) -> i32 {
        self.maximum
    }

    pub fn set_maximum(&mut self, maximum: i32) {
        self.maximum = maximum;
    }
}

property! {
    pub SliderValue: Slider => i32 {
        read: value,
        write: set_value,
        notify: "valueChanged",
        reset: reset_value,
    }
}

property! {
    /// Has no notify channel
    pub SliderMaximum: Slider => i32 {
        read: maximum,
        write: set_maximum,
    }
}

#[derive(Debug, Default)]
pub struct Label {
    pub text: String,
}

impl Label {
    pub fn text(&self) -> String {
        self.text.clone()
    }

    pub fn set_text(&mut self, text: String) -> bool {
        if self.text == text {
            return false;
        }
        self.text = text;
        true
    }
}

property! {
    pub LabelText: Label => String {
        read: text,
        write: set_text,
        notify: "textChanged",
    }
}

#[derive(Debug, Default)]
pub struct Spinner {
    count: i8,
}

impl Spinner {
    pub fn count(&self) -> i8 {
        self.count
    }

    pub fn set_count(&mut self, count: i8) {
        self.count = count;
    }
}

property! {
    pub SpinnerCount: Spinner => i8 {
        read: count,
        write: set_count,
    }
}
