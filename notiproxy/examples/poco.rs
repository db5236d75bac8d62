//! Example showing property-changed notifications from a generated proxy.
//!
//! Run with: `RUST_LOG=debug cargo run --example poco`

use notiproxy::prelude::*;

/// Plain data object. Only `value` is intercepted; `should_not_be_proxied`
/// opts out and `dependant_on_value` is announced whenever `value` changes.
#[derive(Debug, Default, Reflect)]
#[reflect(constructor(default), constructor(new(value: String)))]
#[reflect(computed(name = "DependantOnValue", ty = String, getter = dependant_on_value))]
pub struct Poco {
    #[reflect(overridable, depends_on = "DependantOnValue")]
    value: String,
    #[reflect(overridable, no_proxy)]
    should_not_be_proxied: String,
}

impl Poco {
    pub fn new(value: String) -> Self {
        Self {
            value,
            should_not_be_proxied: String::new(),
        }
    }

    pub fn dependant_on_value(&self) -> String {
        format!("depends on '{}'", self.value)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let source = notiproxy::factory().generate_source(&[TypeHandle::of::<Poco>()])?;
    println!("Generated source:\n{}", source);

    let mut poco = get_proxy_instance::<Poco>(args!["initial".to_string()])?;
    println!("Proxy type: {}", poco.generated_type().name());

    poco.property_changed()
        .subscribe(|e| println!("[Poco] property changed: {}", e.property_name()));

    println!("Setting Value = \"X\"");
    poco.set("Value", Value::new("X".to_string()))?;
    println!("Value is now {:?}, {}", poco.value, poco.dependant_on_value());

    println!("Setting ShouldNotBeProxied = \"Y\"");
    poco.set("ShouldNotBeProxied", Value::new("Y".to_string()))?;
    println!("ShouldNotBeProxied is now {:?}", poco.should_not_be_proxied);

    Ok(())
}
