//! The marshalling policy table.
//!
//! Each [`TypeCategory`] maps to a parameter policy (argument type check plus
//! conversion from a JerryScript value into `argN`) and a return policy
//! (conversion of `result` back into a JerryScript value).

use crate::category::{NativeType, StringKind, TypeCategory};
use crate::error::{CodegenError, Result};
use mbedwrap_dwarf::{NodeId, SymbolTree};

/// Name of the routine that wraps a native pointer into a JS object.
pub const WRAP_NATIVE_OBJECT: &str = "mbed_js_wrap_native_object";

/// How one argument is checked and converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamLowering {
    /// JerryScript type name for `CHECK_ARGUMENT_TYPE_*`.
    pub check: &'static str,
    /// Statements that bind `argN`.
    pub conversion: Vec<String>,
    /// Statements run after the native call.
    pub cleanup: Vec<String>,
}

/// How a native result is turned into the function's return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnLowering {
    /// Statements performing the call, binding `result` when non-void.
    pub call: Vec<String>,
    /// Statements returning a `jerry_value_t`; nested lines carry their own
    /// indentation.
    pub ret: Vec<String>,
}

fn record_spelling(tree: &SymbolTree, id: NodeId) -> Result<String> {
    crate::category::spelling(tree, id)
}

/// Parameter policy for argument `index`.
pub fn param_policy(tree: &SymbolTree, ty: &NativeType, index: usize) -> Result<ParamLowering> {
    let arg = format!("arg{index}");
    let js = format!("args[{index}]");
    let lowering = match ty.category {
        TypeCategory::Void => return Err(CodegenError::MissingParameterType(index)),
        TypeCategory::Numeric | TypeCategory::Enum(_) => ParamLowering {
            check: "number",
            conversion: vec![format!(
                "{ty} {arg} = static_cast<{ty}>(jerry_get_number_value({js}));",
                ty = ty.spelling
            )],
            cleanup: Vec::new(),
        },
        TypeCategory::Boolean => ParamLowering {
            check: "boolean",
            conversion: vec![format!("bool {arg} = jerry_get_boolean_value({js});")],
            cleanup: Vec::new(),
        },
        TypeCategory::String(kind) => {
            let mut conversion = vec![
                format!("jerry_size_t {arg}_size = jerry_get_string_size({js});"),
                format!("char* {arg}_buffer = (char*) malloc({arg}_size + 1);"),
                format!(
                    "jerry_string_to_char_buffer({js}, (jerry_char_t*) {arg}_buffer, {arg}_size);"
                ),
                format!("{arg}_buffer[{arg}_size] = '\\0';"),
            ];
            let mut cleanup = Vec::new();
            match kind {
                StringKind::Owned => {
                    conversion.push(format!("{} {arg}({arg}_buffer);", ty.spelling));
                    conversion.push(format!("free({arg}_buffer);"));
                }
                StringKind::CStr => {
                    conversion.push(format!("{} {arg} = {arg}_buffer;", ty.spelling));
                    cleanup.push(format!("free({arg}_buffer);"));
                }
            }
            ParamLowering {
                check: "string",
                conversion,
                cleanup,
            }
        }
        TypeCategory::Handle(_) => ParamLowering {
            check: "object",
            conversion: unwrap_handle(
                &arg,
                &js,
                &format!("{ty} {arg} = reinterpret_cast<{ty}>({arg}_handle);", ty = ty.spelling),
            ),
            cleanup: Vec::new(),
        },
        TypeCategory::ByRef(class) | TypeCategory::Object(class) => {
            let class = record_spelling(tree, class)?;
            ParamLowering {
                check: "object",
                conversion: unwrap_handle(
                    &arg,
                    &js,
                    &format!("{class}& {arg} = *reinterpret_cast<{class}*>({arg}_handle);"),
                ),
                cleanup: Vec::new(),
            }
        }
    };
    Ok(lowering)
}

fn unwrap_handle(arg: &str, js: &str, bind: &str) -> Vec<String> {
    vec![
        format!("uintptr_t {arg}_handle;"),
        format!("jerry_get_object_native_handle({js}, &{arg}_handle);"),
        bind.to_string(),
    ]
}

/// Return policy for a call expression such as `native_ptr->read(arg0)`.
///
/// The wrap routine only knows `owner`, so records of any other class are
/// rejected whether returned by pointer or by value.
pub fn return_policy(
    tree: &SymbolTree,
    owner: NodeId,
    ty: &NativeType,
    call: &str,
) -> Result<ReturnLowering> {
    let ret = match ty.category {
        TypeCategory::Void => {
            return Ok(ReturnLowering {
                call: vec![format!("{call};")],
                ret: vec!["return jerry_create_undefined();".into()],
            });
        }
        TypeCategory::Numeric | TypeCategory::Enum(_) => {
            vec!["return jerry_create_number((double) result);".to_string()]
        }
        TypeCategory::Boolean => vec!["return jerry_create_boolean(result);".to_string()],
        TypeCategory::String(StringKind::Owned) => vec![
            "return jerry_create_string_sz((const jerry_char_t*) result.c_str(), result.size());"
                .to_string(),
        ],
        TypeCategory::String(StringKind::CStr) => {
            let mut ret = null_guard();
            ret.push("return jerry_create_string((const jerry_char_t*) result);".into());
            ret
        }
        TypeCategory::Handle(class) | TypeCategory::Object(class)
            if !same_record(tree, class, owner) =>
        {
            return Err(CodegenError::UnsupportedReturn(ty.spelling.clone()));
        }
        TypeCategory::Handle(class) => {
            let class = record_spelling(tree, class)?;
            let mut ret = null_guard();
            if ty.spelling == format!("{class}*") {
                ret.push(format!("return {WRAP_NATIVE_OBJECT}(result);"));
            } else {
                ret.push(format!(
                    "return {WRAP_NATIVE_OBJECT}(const_cast<{class}*>(result));"
                ));
            }
            ret
        }
        TypeCategory::Object(class) => {
            let class = record_spelling(tree, class)?;
            vec![format!("return {WRAP_NATIVE_OBJECT}(new {class}(result));")]
        }
        TypeCategory::ByRef(_) => return Err(CodegenError::UnsupportedReturn(ty.spelling.clone())),
    };

    Ok(ReturnLowering {
        call: vec![format!("{} result = {call};", ty.spelling)],
        ret,
    })
}

/// Declarations and definitions of one class are separate nodes.
fn same_record(tree: &SymbolTree, a: NodeId, b: NodeId) -> bool {
    a == b || tree.qualified_name(a).is_some_and(|name| tree.qualified_name(b) == Some(name))
}

/// A null native pointer becomes JS `null`; it is never wrapped.
fn null_guard() -> Vec<String> {
    vec![
        "if (result == NULL) {".into(),
        "    return jerry_create_null();".into(),
        "}".into(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use mbedwrap_dwarf::parse_dump;

    const DUMP: &str = r#"
 <0><b>: Abbrev Number: 9 (DW_TAG_compile_unit)
 <1><10>: Abbrev Number: 1 (DW_TAG_class_type)
    <11>   DW_AT_name        : Led
 <1><20>: Abbrev Number: 1 (DW_TAG_class_type)
    <21>   DW_AT_name        : Pin
 <1><30>: Abbrev Number: 2 (DW_TAG_enumeration_type)
    <31>   DW_AT_name        : Color
"#;

    fn tree() -> SymbolTree {
        parse_dump(DUMP).unwrap().tree
    }

    fn native(category: TypeCategory, spelling: &str) -> NativeType {
        NativeType {
            category,
            spelling: spelling.into(),
        }
    }

    fn ids(tree: &SymbolTree) -> (NodeId, NodeId, NodeId) {
        (
            tree.lookup("10").unwrap(),
            tree.lookup("20").unwrap(),
            tree.lookup("30").unwrap(),
        )
    }

    #[test]
    fn test_numeric_param() {
        let lowering = param_policy(&tree(), &native(TypeCategory::Numeric, "float"), 1).unwrap();
        assert_eq!(lowering.check, "number");
        assert_eq!(
            lowering.conversion,
            vec!["float arg1 = static_cast<float>(jerry_get_number_value(args[1]));"]
        );
        assert!(lowering.cleanup.is_empty());
    }

    #[test]
    fn test_cstr_param_frees_after_call() {
        let lowering = param_policy(
            &tree(),
            &native(TypeCategory::String(StringKind::CStr), "const char*"),
            0,
        )
        .unwrap();
        assert_eq!(lowering.check, "string");
        assert_eq!(lowering.conversion.last().unwrap(), "const char* arg0 = arg0_buffer;");
        assert_eq!(lowering.cleanup, vec!["free(arg0_buffer);"]);
    }

    #[test]
    fn test_owned_string_param_frees_before_call() {
        let lowering = param_policy(
            &tree(),
            &native(TypeCategory::String(StringKind::Owned), "std::string"),
            0,
        )
        .unwrap();
        assert_eq!(
            &lowering.conversion[4..],
            ["std::string arg0(arg0_buffer);", "free(arg0_buffer);"]
        );
        assert!(lowering.cleanup.is_empty());
    }

    #[test]
    fn test_handle_param_unwraps() {
        let tree = tree();
        let (led, _, _) = ids(&tree);
        let lowering = param_policy(&tree, &native(TypeCategory::Handle(led), "Led*"), 0).unwrap();
        assert_eq!(lowering.check, "object");
        assert_eq!(
            lowering.conversion,
            vec![
                "uintptr_t arg0_handle;",
                "jerry_get_object_native_handle(args[0], &arg0_handle);",
                "Led* arg0 = reinterpret_cast<Led*>(arg0_handle);",
            ]
        );
    }

    #[test]
    fn test_const_handle_param_keeps_qualifier() {
        let tree = tree();
        let (led, _, _) = ids(&tree);
        let lowering =
            param_policy(&tree, &native(TypeCategory::Handle(led), "const Led*"), 2).unwrap();
        assert_eq!(
            lowering.conversion.last().unwrap(),
            "const Led* arg2 = reinterpret_cast<const Led*>(arg2_handle);"
        );
    }

    #[test]
    fn test_record_params_bind_references() {
        let tree = tree();
        let (led, pin, _) = ids(&tree);
        for ty in [
            native(TypeCategory::ByRef(pin), "Pin&"),
            native(TypeCategory::Object(pin), "Pin"),
        ] {
            let lowering = param_policy(&tree, &ty, 0).unwrap();
            assert_eq!(lowering.check, "object");
            assert_eq!(
                lowering.conversion.last().unwrap(),
                "Pin& arg0 = *reinterpret_cast<Pin*>(arg0_handle);"
            );
        }
        let own = param_policy(&tree, &native(TypeCategory::Object(led), "Led"), 0).unwrap();
        assert_eq!(
            own.conversion.last().unwrap(),
            "Led& arg0 = *reinterpret_cast<Led*>(arg0_handle);"
        );
    }

    #[test]
    fn test_every_category_in_both_positions() {
        let tree = tree();
        let (led, pin, color) = ids(&tree);

        // (type, argument check, final return statement); `None` is a rejection.
        let table = [
            (native(TypeCategory::Void, "void"), None, Some("return jerry_create_undefined();")),
            (
                native(TypeCategory::Numeric, "int"),
                Some("number"),
                Some("return jerry_create_number((double) result);"),
            ),
            (
                native(TypeCategory::Enum(color), "Color"),
                Some("number"),
                Some("return jerry_create_number((double) result);"),
            ),
            (
                native(TypeCategory::Boolean, "bool"),
                Some("boolean"),
                Some("return jerry_create_boolean(result);"),
            ),
            (
                native(TypeCategory::String(StringKind::Owned), "std::string"),
                Some("string"),
                Some("return jerry_create_string_sz((const jerry_char_t*) result.c_str(), result.size());"),
            ),
            (
                native(TypeCategory::String(StringKind::CStr), "const char*"),
                Some("string"),
                Some("return jerry_create_string((const jerry_char_t*) result);"),
            ),
            (
                native(TypeCategory::Handle(led), "Led*"),
                Some("object"),
                Some("return mbed_js_wrap_native_object(result);"),
            ),
            (
                native(TypeCategory::Handle(led), "const Led*"),
                Some("object"),
                Some("return mbed_js_wrap_native_object(const_cast<Led*>(result));"),
            ),
            (native(TypeCategory::Handle(pin), "Pin*"), Some("object"), None),
            (native(TypeCategory::ByRef(led), "Led&"), Some("object"), None),
            (
                native(TypeCategory::Object(led), "Led"),
                Some("object"),
                Some("return mbed_js_wrap_native_object(new Led(result));"),
            ),
            (native(TypeCategory::Object(pin), "Pin"), Some("object"), None),
        ];

        for (ty, check, ret) in table {
            match (param_policy(&tree, &ty, 0), check) {
                (Ok(lowering), Some(check)) => assert_eq!(lowering.check, check, "{ty:?}"),
                (Err(_), None) => {}
                (other, _) => panic!("unexpected parameter lowering for {ty:?}: {other:?}"),
            }
            match (return_policy(&tree, led, &ty, "native_ptr->get()"), ret) {
                (Ok(lowering), Some(ret)) => {
                    assert_eq!(lowering.ret.last().map(String::as_str), Some(ret), "{ty:?}")
                }
                (Err(CodegenError::UnsupportedReturn(spelling)), None) => {
                    assert_eq!(spelling, ty.spelling)
                }
                (other, _) => panic!("unexpected return lowering for {ty:?}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_pointer_returns_check_null_before_wrapping() {
        let tree = tree();
        let (led, _, _) = ids(&tree);
        for ty in [
            native(TypeCategory::Handle(led), "Led*"),
            native(TypeCategory::String(StringKind::CStr), "const char*"),
        ] {
            let lowering = return_policy(&tree, led, &ty, "native_ptr->next()").unwrap();
            assert_eq!(
                lowering.call,
                vec![format!("{} result = native_ptr->next();", ty.spelling)]
            );
            assert_eq!(lowering.ret[0], "if (result == NULL) {");
            assert_eq!(lowering.ret[1], "    return jerry_create_null();");
            assert_eq!(lowering.ret.len(), 4);
        }
    }

    #[test]
    fn test_void_return_makes_the_call_alone() {
        let tree = tree();
        let (led, _, _) = ids(&tree);
        let void =
            return_policy(&tree, led, &native(TypeCategory::Void, "void"), "native_ptr->on()")
                .unwrap();
        assert_eq!(void.call, vec!["native_ptr->on();"]);
        assert_eq!(void.ret, vec!["return jerry_create_undefined();"]);
    }
}
