//! Text of the generated package files.

use crate::error::Result;
use mbedwrap_codegen::ClassBindings;
use serde::Serialize;

const BANNER: &str = "/* Generated by mbedwrap */";

/// Names shared by every template of one package.
#[derive(Debug, Clone)]
pub struct PackageNames {
    pub library: String,
    pub js_class: String,
    pub native_class: String,
}

impl PackageNames {
    /// `mbed-js-<lib>`, the include directory and npm package name.
    pub fn package(&self) -> String {
        format!("mbed-js-{}", self.library)
    }

    pub fn class_header(&self) -> String {
        format!("mbed-js-{}.h", self.js_class.to_lowercase())
    }

    pub fn lib_header(&self) -> String {
        format!("mbed-js-{}-lib.h", self.library)
    }

    pub fn source_file(&self) -> String {
        format!("mbed-js-{}.cpp", self.js_class.to_lowercase())
    }
}

fn guard(parts: &[&str]) -> String {
    let name: String = parts
        .join("_")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("_JERRYSCRIPT_MBED_{name}_H")
}

/// Header declaring the constructor and the object wrapper.
pub fn class_header(names: &PackageNames) -> String {
    let guard = guard(&[&names.library, &names.js_class]);
    format!(
        "{BANNER}

#ifndef {guard}
#define {guard}

#include \"jerryscript-mbed-library-registry/wrap_tools.h\"

// Include the header that declares {native} before this point.

DECLARE_CLASS_CONSTRUCTOR({js});
jerry_value_t mbed_js_wrap_native_object({native}* ptr);

#endif // {guard}
",
        native = names.native_class,
        js = names.js_class,
    )
}

/// Registration header wiring the class into the library registry.
pub fn lib_header(names: &PackageNames) -> String {
    let guard = guard(&["lib", &names.library]);
    format!(
        "{BANNER}

#ifndef {guard}
#define {guard}

#include \"{package}/{class_header}\"
#include \"jerryscript-mbed-library-registry/wrap_tools.h\"

void mbed_js_{js}_setup();

DECLARE_JS_WRAPPER_REGISTRATION ({library})
{{
    REGISTER_CLASS_CONSTRUCTOR({js});
    mbed_js_{js}_setup();
}}

#endif // {guard}
",
        package = names.package(),
        class_header = names.class_header(),
        js = names.js_class,
        library = names.library,
    )
}

/// Translation unit with the generated bodies and the enum setup routine.
pub fn source(names: &PackageNames, bindings: &ClassBindings) -> String {
    format!(
        "{BANNER}

#include \"jerryscript-mbed-util/logging.h\"
#include \"jerryscript-mbed-library-registry/wrap_tools.h\"
#include \"{package}/{class_header}\"

{body}

{setup}",
        package = names.package(),
        class_header = names.class_header(),
        body = bindings.source,
        setup = bindings.enums.render_setup(&names.js_class),
    )
}

#[derive(Serialize)]
struct MbedJsJson {
    source: Vec<String>,
    includes: Vec<String>,
    name: String,
}

#[derive(Serialize)]
struct PackageJson {
    name: String,
    version: &'static str,
}

/// `mbedjs.json`, consumed by the JerryScript mbed build.
pub fn mbedjs_json(names: &PackageNames) -> Result<String> {
    let descriptor = MbedJsJson {
        source: vec![".".into()],
        includes: vec![format!("{}/{}", names.package(), names.lib_header())],
        name: names.library.clone(),
    };
    Ok(serde_json::to_string_pretty(&descriptor)? + "\n")
}

pub fn package_json(names: &PackageNames) -> Result<String> {
    let descriptor = PackageJson {
        name: names.package(),
        version: "1.0.0",
    };
    Ok(serde_json::to_string_pretty(&descriptor)? + "\n")
}
