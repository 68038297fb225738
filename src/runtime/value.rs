//! Values and operations that cross the native boundary.

use super::signature::{JavaType, MethodSignature, SignatureError};
use serde::Serialize;
use std::fmt;

/// `java.lang.String` and every type it can be assigned to.
const STRING_SUPERTYPES: &[&str] = &[
    "java/lang/String",
    "java/lang/Object",
    "java/lang/CharSequence",
    "java/lang/Comparable",
    "java/io/Serializable",
    "java/lang/constant/Constable",
    "java/lang/constant/ConstantDesc",
];

/// A Java value marshaled to or from the JVM.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum JavaValue {
    Void,
    Boolean(bool),
    Byte(i8),
    /// A UTF-16 code unit, as Java's `char`.
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Null,
}

impl JavaValue {
    /// Whether this value may be passed where `ty` is expected.
    pub fn conforms_to(&self, ty: &JavaType) -> bool {
        match (self, ty) {
            (JavaValue::Boolean(_), JavaType::Boolean)
            | (JavaValue::Byte(_), JavaType::Byte)
            | (JavaValue::Char(_), JavaType::Char)
            | (JavaValue::Short(_), JavaType::Short)
            | (JavaValue::Int(_), JavaType::Int)
            | (JavaValue::Long(_), JavaType::Long)
            | (JavaValue::Float(_), JavaType::Float)
            | (JavaValue::Double(_), JavaType::Double)
            | (JavaValue::Void, JavaType::Void) => true,
            (JavaValue::String(_), JavaType::Object(class)) => {
                STRING_SUPERTYPES.contains(&class.as_str())
            }
            (JavaValue::Null, JavaType::Object(_) | JavaType::Array(_)) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JavaValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            JavaValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            JavaValue::Long(l) => Some(*l),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JavaValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, JavaValue::Null)
    }
}

impl fmt::Display for JavaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaValue::Void => f.write_str("void"),
            JavaValue::Boolean(b) => write!(f, "{}", b),
            JavaValue::Byte(b) => write!(f, "{}", b),
            JavaValue::Char(c) => match char::from_u32(u32::from(*c)) {
                Some(ch) => write!(f, "'{}'", ch),
                None => write!(f, "'\\u{:04x}'", c),
            },
            JavaValue::Short(s) => write!(f, "{}", s),
            JavaValue::Int(i) => write!(f, "{}", i),
            JavaValue::Long(l) => write!(f, "{}L", l),
            JavaValue::Float(x) => write!(f, "{}f", x),
            JavaValue::Double(d) => write!(f, "{}", d),
            JavaValue::String(s) => write!(f, "{:?}", s),
            JavaValue::Null => f.write_str("null"),
        }
    }
}

impl From<bool> for JavaValue {
    fn from(value: bool) -> Self {
        JavaValue::Boolean(value)
    }
}

impl From<i32> for JavaValue {
    fn from(value: i32) -> Self {
        JavaValue::Int(value)
    }
}

impl From<i64> for JavaValue {
    fn from(value: i64) -> Self {
        JavaValue::Long(value)
    }
}

impl From<f64> for JavaValue {
    fn from(value: f64) -> Self {
        JavaValue::Double(value)
    }
}

impl From<&str> for JavaValue {
    fn from(value: &str) -> Self {
        JavaValue::String(value.to_string())
    }
}

impl From<String> for JavaValue {
    fn from(value: String) -> Self {
        JavaValue::String(value)
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// One call into the JVM. Class names are kept in JNI internal form
/// (`java/lang/System`); dotted names are normalized on construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    CallStatic {
        class: String,
        method: String,
        signature: String,
        args: Vec<JavaValue>,
    },
    GetStatic {
        class: String,
        field: String,
        signature: String,
    },
}

impl Operation {
    pub fn call_static(
        class: &str,
        method: &str,
        signature: &str,
        args: Vec<JavaValue>,
    ) -> Self {
        Operation::CallStatic {
            class: internal_class_name(class),
            method: method.to_string(),
            signature: signature.to_string(),
            args,
        }
    }

    pub fn get_static(class: &str, field: &str, signature: &str) -> Self {
        Operation::GetStatic {
            class: internal_class_name(class),
            field: field.to_string(),
            signature: signature.to_string(),
        }
    }

    pub fn class(&self) -> &str {
        match self {
            Operation::CallStatic { class, .. } | Operation::GetStatic { class, .. } => class,
        }
    }

    /// Checks the argument list and return type against the signature
    /// before anything reaches the native side.
    pub fn validate(&self) -> Result<(), SignatureError> {
        match self {
            Operation::CallStatic {
                signature, args, ..
            } => {
                let parsed = MethodSignature::parse(signature)?;
                parsed.check_args(args)?;
                parsed.ret.ensure_returnable()
            }
            Operation::GetStatic { signature, .. } => {
                let ty = JavaType::parse_field(signature)?;
                if ty == JavaType::Void {
                    return Err(SignatureError::new(signature, "a field cannot have type void"));
                }
                ty.ensure_returnable()
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CallStatic {
                class,
                method,
                signature,
                ..
            } => write!(f, "{}.{}{}", class, method, signature),
            Operation::GetStatic {
                class,
                field,
                signature,
            } => write!(f, "{}.{}:{}", class, field, signature),
        }
    }
}

fn internal_class_name(name: &str) -> String {
    name.replace('.', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_class_names_are_normalized() {
        let op = Operation::get_static("java.lang.Integer", "MAX_VALUE", "I");
        assert_eq!(op.class(), "java/lang/Integer");
        assert_eq!(op.to_string(), "java/lang/Integer.MAX_VALUE:I");
    }

    #[test]
    fn argument_mismatch_is_rejected() {
        let op = Operation::call_static("java/lang/Math", "abs", "(I)I", vec![JavaValue::Long(3)]);
        let err = op.validate().unwrap_err();
        assert!(err.to_string().contains("argument 0"));
    }

    #[test]
    fn strings_pass_as_string_or_its_supertypes() {
        let s = JavaValue::from("x");
        assert!(s.conforms_to(&JavaType::Object("java/lang/String".into())));
        assert!(s.conforms_to(&JavaType::Object("java/lang/Object".into())));
        assert!(s.conforms_to(&JavaType::Object("java/lang/CharSequence".into())));
        assert!(s.conforms_to(&JavaType::Object("java/lang/Comparable".into())));
        assert!(s.conforms_to(&JavaType::Object("java/io/Serializable".into())));
        assert!(!s.conforms_to(&JavaType::Object("java/lang/Integer".into())));
        assert!(!s.conforms_to(&JavaType::Object("java/util/List".into())));
        assert!(JavaValue::Null.conforms_to(&JavaType::Object("java/util/List".into())));
    }

    #[test]
    fn char_sequence_parameters_accept_strings() {
        let op = Operation::call_static(
            "java/lang/Character",
            "codePointAt",
            "(Ljava/lang/CharSequence;I)I",
            vec![JavaValue::from("a😀b"), JavaValue::Int(1)],
        );
        assert!(op.validate().is_ok());
    }
}
