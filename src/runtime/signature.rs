//! JNI type descriptors (`I`, `Ljava/lang/String;`, `(IJ)V`, ...).

use super::value::JavaValue;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

/// A descriptor that could not be parsed, or that does not fit the values
/// supplied for it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{signature}`: {reason}")]
pub struct SignatureError {
    pub signature: String,
    pub reason: String,
}

impl SignatureError {
    pub fn new(signature: &str, reason: impl Into<String>) -> Self {
        Self {
            signature: signature.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JavaType {
    Void,
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    /// A reference type, class name in internal form.
    Object(String),
    Array(Box<JavaType>),
}

impl JavaType {
    /// Parses a complete field descriptor such as `I` or `[Ljava/lang/String;`.
    pub fn parse_field(descriptor: &str) -> Result<JavaType, SignatureError> {
        let mut chars = descriptor.chars().peekable();
        let ty = parse_type(descriptor, &mut chars)?;
        if chars.next().is_some() {
            return Err(SignatureError::new(descriptor, "trailing characters after type"));
        }
        Ok(ty)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, JavaType::Object(class) if class == "java/lang/String")
    }

    /// Results are marshaled for primitives, `void` and `java.lang.String`
    /// only; other references have no Rust-side representation.
    pub fn ensure_returnable(&self) -> Result<(), SignatureError> {
        match self {
            JavaType::Object(_) if self.is_string() => Ok(()),
            JavaType::Object(_) | JavaType::Array(_) => Err(SignatureError::new(
                &self.to_string(),
                "only primitive, void and java/lang/String results can be marshaled",
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Void => f.write_str("V"),
            JavaType::Boolean => f.write_str("Z"),
            JavaType::Byte => f.write_str("B"),
            JavaType::Char => f.write_str("C"),
            JavaType::Short => f.write_str("S"),
            JavaType::Int => f.write_str("I"),
            JavaType::Long => f.write_str("J"),
            JavaType::Float => f.write_str("F"),
            JavaType::Double => f.write_str("D"),
            JavaType::Object(class) => write!(f, "L{};", class),
            JavaType::Array(inner) => write!(f, "[{}", inner),
        }
    }
}

/// A parsed method descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub params: Vec<JavaType>,
    pub ret: JavaType,
}

impl MethodSignature {
    pub fn parse(descriptor: &str) -> Result<MethodSignature, SignatureError> {
        let mut chars = descriptor.chars().peekable();
        if chars.next() != Some('(') {
            return Err(SignatureError::new(descriptor, "method descriptor must start with '('"));
        }
        let mut params = Vec::new();
        loop {
            match chars.peek() {
                Some(')') => {
                    chars.next();
                    break;
                }
                Some(_) => {
                    let ty = parse_type(descriptor, &mut chars)?;
                    if ty == JavaType::Void {
                        return Err(SignatureError::new(descriptor, "parameters cannot be void"));
                    }
                    params.push(ty);
                }
                None => return Err(SignatureError::new(descriptor, "unterminated parameter list")),
            }
        }
        let ret = parse_type(descriptor, &mut chars)?;
        if chars.next().is_some() {
            return Err(SignatureError::new(descriptor, "trailing characters after return type"));
        }
        Ok(MethodSignature { params, ret })
    }

    /// Verifies arity and that every argument conforms to its parameter.
    pub fn check_args(&self, args: &[JavaValue]) -> Result<(), SignatureError> {
        if args.len() != self.params.len() {
            return Err(SignatureError::new(
                &self.to_string(),
                format!("expected {} argument(s), got {}", self.params.len(), args.len()),
            ));
        }
        for (index, (arg, param)) in args.iter().zip(&self.params).enumerate() {
            if !arg.conforms_to(param) {
                return Err(SignatureError::new(
                    &self.to_string(),
                    format!("argument {} is {}, which does not conform to {}", index, arg, param),
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for param in &self.params {
            write!(f, "{}", param)?;
        }
        write!(f, "){}", self.ret)
    }
}

fn parse_type(descriptor: &str, chars: &mut Peekable<Chars<'_>>) -> Result<JavaType, SignatureError> {
    let Some(c) = chars.next() else {
        return Err(SignatureError::new(descriptor, "unexpected end of descriptor"));
    };
    let ty = match c {
        'V' => JavaType::Void,
        'Z' => JavaType::Boolean,
        'B' => JavaType::Byte,
        'C' => JavaType::Char,
        'S' => JavaType::Short,
        'I' => JavaType::Int,
        'J' => JavaType::Long,
        'F' => JavaType::Float,
        'D' => JavaType::Double,
        'L' => {
            let mut class = String::new();
            loop {
                match chars.next() {
                    Some(';') => break,
                    Some(ch) => class.push(ch),
                    None => {
                        return Err(SignatureError::new(descriptor, "unterminated class name"))
                    }
                }
            }
            if class.is_empty() {
                return Err(SignatureError::new(descriptor, "empty class name"));
            }
            JavaType::Object(class)
        }
        '[' => {
            let inner = parse_type(descriptor, chars)?;
            if inner == JavaType::Void {
                return Err(SignatureError::new(descriptor, "array of void"));
            }
            JavaType::Array(Box::new(inner))
        }
        other => {
            return Err(SignatureError::new(
                descriptor,
                format!("unknown type character '{}'", other),
            ))
        }
    };
    Ok(ty)
}
