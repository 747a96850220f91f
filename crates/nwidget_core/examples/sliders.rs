//! Sliders Example
//!
//! Three sliders and a label wired together with bindings:
//!
//! - `total = a + b`, kept up to date as `a` and `b` move
//! - the label shows whether the total crossed a threshold
//! - a free callable logs every new total
//!
//! Run with: RUST_LOG=nwidget_core=debug cargo run -p nwidget_core --example sliders

use nwidget_core::prelude::*;
use nwidget_core::Result;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Slider {
    value: i32,
}

impl Slider {
    fn value(&self) -> i32 {
        self.value
    }

    fn set_value(&mut self, value: i32) -> bool {
        let changed = self.value != value;
        self.value = value;
        changed
    }
}

#[derive(Debug, Default)]
struct Label {
    text: String,
}

impl Label {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn set_text(&mut self, text: String) {
        self.text = text;
    }
}

property! {
    Value: Slider => i32 {
        read: value,
        write: set_value,
        notify: "valueChanged",
    }
}

property! {
    Text: Label => String {
        read: text,
        write: set_text,
        notify: "textChanged",
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let rt = Runtime::new();
    let window = rt.create(());
    let a = rt.create_child(window.id(), Slider::default());
    let b = rt.create_child(window.id(), Slider::default());
    let total = rt.create_child(window.id(), Slider::default());
    let label = rt.create_child(window.id(), Label::default());

    total.prop(Value).bind(a.prop(Value) + b.prop(Value));
    label.prop(Text).bind(cond(
        total.prop(Value).ge(100),
        format("{} (over)", (total.prop(Value),)),
        format("{} (under)", (total.prop(Value),)),
    ));
    total
        .prop(Value)
        .bind_to_fn(&window, "log", |v: i32| println!("total is now {v}"));

    for (x, y) in [(10, 20), (60, 50), (5, 5)] {
        a.prop(Value).set(x);
        b.prop(Value).set(y);
        println!("label: {}", label.prop(Text).get());
    }

    // Handles can be recovered from ids
    let again = rt.handle::<Slider>(total.id())?;
    println!("final total: {}", again.prop(Value).get());

    rt.destroy(window.id());
    rt.process_events();
    println!("{:?}", rt.stats());
    Ok(())
}
