//! The production backend: loads the JVM shared library with `libloading` and
//! drives it through the JNI invocation and native interfaces.
//!
//! Only one JVM can ever be created in a process, even after it has been
//! destroyed, so creation is guarded by a process-wide flag and a second
//! attempt reports `JNI_EEXIST` without touching the library.
//!
//! JNI's `*UTF` string functions speak Java's modified UTF-8 (CESU-8 with a
//! two-byte NUL), not standard UTF-8. Every name and string crossing the
//! boundary goes through [`java_cstring`] and [`from_java_chars`].

use super::backend::{NativeBackend, NativeFailure};
use super::signature::{JavaType, MethodSignature};
use super::value::{JavaValue, Operation};
use crate::status::StatusCode;
use jni_sys::{
    jboolean, jclass, jint, jobject, jstring, jvalue, JNIEnv, JavaVM, JavaVMInitArgs,
    JavaVMOption, JNI_FALSE, JNI_OK, JNI_VERSION_1_8,
};
use cesu8::{from_java_cesu8, to_java_cesu8};
use libloading::Library;
use std::ffi::{c_char, c_void, CStr, CString};
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};

type CreateJavaVmFn = unsafe extern "system" fn(*mut *mut JavaVM, *mut *mut c_void, *mut c_void) -> jint;

static VM_CREATED: AtomicBool = AtomicBool::new(false);

/// Fetches a function from a JNI table, failing instead of panicking when
/// the slot is empty.
macro_rules! jni_fn {
    ($table:expr, $name:ident) => {
        (**$table).$name.ok_or_else(|| {
            NativeFailure::new(
                StatusCode::Err,
                concat!("JNI function table has no ", stringify!($name)),
            )
        })?
    };
}

struct VmPtr(*mut JavaVM);

// The invocation interface is documented as callable from any thread.
unsafe impl Send for VmPtr {}
unsafe impl Sync for VmPtr {}

/// A [`NativeBackend`] over a real `libjvm`.
pub struct JniBackend {
    library_path: PathBuf,
    library: Option<Library>,
    vm: Option<VmPtr>,
}

impl JniBackend {
    pub fn new(library_path: impl AsRef<Path>) -> Self {
        Self {
            library_path: library_path.as_ref().to_path_buf(),
            library: None,
            vm: None,
        }
    }

    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    fn vm(&self) -> Result<*mut JavaVM, NativeFailure> {
        self.vm
            .as_ref()
            .map(|vm| vm.0)
            .ok_or_else(|| NativeFailure::new(StatusCode::Err, "the JVM has not been created"))
    }

    /// The calling thread's `JNIEnv`, or `JNI_EDETACHED` if it has none.
    fn env(&self) -> Result<Env, NativeFailure> {
        let vm = self.vm()?;
        let mut env: *mut c_void = ptr::null_mut();
        let status = unsafe {
            let get_env = jni_fn!(vm, GetEnv);
            get_env(vm, &mut env, JNI_VERSION_1_8)
        };
        if status != JNI_OK {
            return Err(NativeFailure::new(
                StatusCode::from_raw(status),
                "GetEnv failed for the calling thread",
            ));
        }
        Ok(Env(env as *mut JNIEnv))
    }
}

impl NativeBackend for JniBackend {
    fn create(&mut self, options: &[String]) -> Result<(), NativeFailure> {
        let library = unsafe { Library::new(&self.library_path) }.map_err(|err| {
            NativeFailure::new(
                StatusCode::Err,
                format!("cannot load {}: {}", self.library_path.display(), err),
            )
        })?;
        let create: CreateJavaVmFn = unsafe {
            let symbol = library
                .get::<CreateJavaVmFn>(b"JNI_CreateJavaVM\0")
                .map_err(|err| {
                    NativeFailure::new(
                        StatusCode::Err,
                        format!(
                            "{} does not export JNI_CreateJavaVM: {}",
                            self.library_path.display(),
                            err
                        ),
                    )
                })?;
            *symbol
        };
        self.library = Some(library);

        let c_options = options
            .iter()
            .map(|option| CString::new(option.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| {
                NativeFailure::new(StatusCode::Inval, format!("JVM option contains a NUL byte: {}", err))
            })?;
        let mut raw_options: Vec<JavaVMOption> = c_options
            .iter()
            .map(|option| JavaVMOption {
                optionString: option.as_ptr() as *mut c_char,
                extraInfo: ptr::null_mut(),
            })
            .collect();
        let mut init_args = JavaVMInitArgs {
            version: JNI_VERSION_1_8,
            nOptions: raw_options.len() as jint,
            options: raw_options.as_mut_ptr(),
            ignoreUnrecognized: JNI_FALSE,
        };

        if VM_CREATED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(NativeFailure::new(
                StatusCode::Exist,
                "a JVM has already been created in this process",
            ));
        }

        let mut vm: *mut JavaVM = ptr::null_mut();
        let mut env: *mut c_void = ptr::null_mut();
        let status = unsafe {
            create(
                &mut vm,
                &mut env,
                &mut init_args as *mut JavaVMInitArgs as *mut c_void,
            )
        };
        if status != JNI_OK {
            return Err(NativeFailure::new(
                StatusCode::from_raw(status),
                format!("JNI_CreateJavaVM rejected options {:?}; see the JVM output above", options),
            ));
        }
        self.vm = Some(VmPtr(vm));
        log::debug!("created JVM from {}", self.library_path.display());
        Ok(())
    }

    fn call(&self, operation: &Operation) -> Result<JavaValue, NativeFailure> {
        let env = self.env()?;
        match operation {
            Operation::CallStatic {
                class,
                method,
                signature,
                args,
            } => {
                let parsed = MethodSignature::parse(signature)
                    .map_err(|err| NativeFailure::new(StatusCode::Inval, err.to_string()))?;
                unsafe { env.call_static(class, method, signature, &parsed, args) }
            }
            Operation::GetStatic {
                class,
                field,
                signature,
            } => {
                let ty = JavaType::parse_field(signature)
                    .map_err(|err| NativeFailure::new(StatusCode::Inval, err.to_string()))?;
                unsafe { env.get_static(class, field, signature, &ty) }
            }
        }
    }

    fn attach_current_thread(&self) -> Result<(), NativeFailure> {
        let vm = self.vm()?;
        let mut env: *mut c_void = ptr::null_mut();
        let status = unsafe {
            let attach = jni_fn!(vm, AttachCurrentThread);
            attach(vm, &mut env, ptr::null_mut())
        };
        if status != JNI_OK {
            return Err(NativeFailure::new(
                StatusCode::from_raw(status),
                "AttachCurrentThread failed",
            ));
        }
        Ok(())
    }

    fn detach_current_thread(&self) -> Result<(), NativeFailure> {
        let vm = self.vm()?;
        let status = unsafe {
            let detach = jni_fn!(vm, DetachCurrentThread);
            detach(vm)
        };
        if status != JNI_OK {
            return Err(NativeFailure::new(
                StatusCode::from_raw(status),
                "DetachCurrentThread failed",
            ));
        }
        Ok(())
    }

    fn destroy(&mut self) -> Result<(), NativeFailure> {
        let result = match self.vm.take() {
            Some(VmPtr(vm)) => {
                let status = unsafe {
                    let destroy = jni_fn!(vm, DestroyJavaVM);
                    destroy(vm)
                };
                // libjvm must stay mapped once a VM has run in this process.
                if let Some(library) = self.library.take() {
                    std::mem::forget(library);
                }
                if status == JNI_OK {
                    Ok(())
                } else {
                    Err(NativeFailure::new(
                        StatusCode::from_raw(status),
                        "DestroyJavaVM failed",
                    ))
                }
            }
            None => {
                self.library.take();
                Ok(())
            }
        };
        log::debug!("released {}", self.library_path.display());
        result
    }

    fn describe(&self) -> String {
        format!("JVM at {}", self.library_path.display())
    }
}

// ============================================================================
// JNIEnv WRAPPER
// ============================================================================

/// A thread-local `JNIEnv` pointer. Never stored; obtained per call.
struct Env(*mut JNIEnv);

impl Env {
    unsafe fn call_static(
        &self,
        class: &str,
        method: &str,
        signature: &str,
        parsed: &MethodSignature,
        args: &[JavaValue],
    ) -> Result<JavaValue, NativeFailure> {
        let env = self.0;
        let clazz = self.find_class(class)?;
        let c_method = java_cstring(method);
        let c_signature = java_cstring(signature);
        let method_id = jni_fn!(env, GetStaticMethodID)(env, clazz, c_method.as_ptr(), c_signature.as_ptr());
        if method_id.is_null() {
            let failure = self.take_exception(&format!("no static method {}.{}{}", class, method, signature));
            self.delete_local(clazz);
            return Err(failure);
        }

        let mut locals = Vec::new();
        let mut raw_args = Vec::with_capacity(args.len());
        for arg in args {
            let raw = match self.to_jvalue(arg) {
                Ok(raw) => raw,
                Err(failure) => {
                    locals.iter().for_each(|obj| self.delete_local(*obj));
                    self.delete_local(clazz);
                    return Err(failure);
                }
            };
            if let JavaValue::String(_) = arg {
                locals.push(raw.l);
            }
            raw_args.push(raw);
        }
        let argp = raw_args.as_ptr();

        let result = match &parsed.ret {
            JavaType::Void => {
                jni_fn!(env, CallStaticVoidMethodA)(env, clazz, method_id, argp);
                Ok(JavaValue::Void)
            }
            JavaType::Boolean => Ok(JavaValue::Boolean(
                jni_fn!(env, CallStaticBooleanMethodA)(env, clazz, method_id, argp) != 0,
            )),
            JavaType::Byte => Ok(JavaValue::Byte(jni_fn!(env, CallStaticByteMethodA)(env, clazz, method_id, argp))),
            JavaType::Char => Ok(JavaValue::Char(jni_fn!(env, CallStaticCharMethodA)(env, clazz, method_id, argp))),
            JavaType::Short => Ok(JavaValue::Short(jni_fn!(env, CallStaticShortMethodA)(env, clazz, method_id, argp))),
            JavaType::Int => Ok(JavaValue::Int(jni_fn!(env, CallStaticIntMethodA)(env, clazz, method_id, argp))),
            JavaType::Long => Ok(JavaValue::Long(jni_fn!(env, CallStaticLongMethodA)(env, clazz, method_id, argp))),
            JavaType::Float => Ok(JavaValue::Float(jni_fn!(env, CallStaticFloatMethodA)(env, clazz, method_id, argp))),
            JavaType::Double => Ok(JavaValue::Double(
                jni_fn!(env, CallStaticDoubleMethodA)(env, clazz, method_id, argp),
            )),
            JavaType::Object(_) | JavaType::Array(_) => {
                let obj = jni_fn!(env, CallStaticObjectMethodA)(env, clazz, method_id, argp);
                self.object_result(obj)
            }
        };

        // A pending exception takes precedence over a failed string conversion.
        let pending = self
            .check_exception(&format!("{}.{}{} threw", class, method, signature))
            .and(result);
        locals.iter().for_each(|obj| self.delete_local(*obj));
        self.delete_local(clazz);
        pending
    }

    unsafe fn get_static(
        &self,
        class: &str,
        field: &str,
        signature: &str,
        ty: &JavaType,
    ) -> Result<JavaValue, NativeFailure> {
        let env = self.0;
        let clazz = self.find_class(class)?;
        let c_field = java_cstring(field);
        let c_signature = java_cstring(signature);
        let field_id = jni_fn!(env, GetStaticFieldID)(env, clazz, c_field.as_ptr(), c_signature.as_ptr());
        if field_id.is_null() {
            let failure = self.take_exception(&format!("no static field {}.{}:{}", class, field, signature));
            self.delete_local(clazz);
            return Err(failure);
        }
        let result = match ty {
            JavaType::Boolean => Ok(JavaValue::Boolean(jni_fn!(env, GetStaticBooleanField)(env, clazz, field_id) != 0)),
            JavaType::Byte => Ok(JavaValue::Byte(jni_fn!(env, GetStaticByteField)(env, clazz, field_id))),
            JavaType::Char => Ok(JavaValue::Char(jni_fn!(env, GetStaticCharField)(env, clazz, field_id))),
            JavaType::Short => Ok(JavaValue::Short(jni_fn!(env, GetStaticShortField)(env, clazz, field_id))),
            JavaType::Int => Ok(JavaValue::Int(jni_fn!(env, GetStaticIntField)(env, clazz, field_id))),
            JavaType::Long => Ok(JavaValue::Long(jni_fn!(env, GetStaticLongField)(env, clazz, field_id))),
            JavaType::Float => Ok(JavaValue::Float(jni_fn!(env, GetStaticFloatField)(env, clazz, field_id))),
            JavaType::Double => Ok(JavaValue::Double(jni_fn!(env, GetStaticDoubleField)(env, clazz, field_id))),
            JavaType::Object(_) | JavaType::Array(_) => {
                let obj = jni_fn!(env, GetStaticObjectField)(env, clazz, field_id);
                self.object_result(obj)
            }
            JavaType::Void => Err(NativeFailure::new(StatusCode::Inval, "a field cannot have type void")),
        };
        let pending = self
            .check_exception(&format!("reading {}.{} threw", class, field))
            .and(result);
        self.delete_local(clazz);
        pending
    }

    unsafe fn find_class(&self, class: &str) -> Result<jclass, NativeFailure> {
        let env = self.0;
        let name = java_cstring(class);
        let clazz = jni_fn!(env, FindClass)(env, name.as_ptr());
        if clazz.is_null() {
            return Err(self.take_exception(&format!("class {} not found", class)));
        }
        Ok(clazz)
    }

    unsafe fn to_jvalue(&self, value: &JavaValue) -> Result<jvalue, NativeFailure> {
        let raw = match value {
            JavaValue::Boolean(b) => jvalue { z: *b as jboolean },
            JavaValue::Byte(b) => jvalue { b: *b },
            JavaValue::Char(c) => jvalue { c: *c },
            JavaValue::Short(s) => jvalue { s: *s },
            JavaValue::Int(i) => jvalue { i: *i },
            JavaValue::Long(j) => jvalue { j: *j },
            JavaValue::Float(f) => jvalue { f: *f },
            JavaValue::Double(d) => jvalue { d: *d },
            JavaValue::Null => jvalue { l: ptr::null_mut() },
            JavaValue::String(s) => jvalue { l: self.new_string(s)? },
            JavaValue::Void => {
                return Err(NativeFailure::new(StatusCode::Inval, "void cannot be passed as an argument"))
            }
        };
        Ok(raw)
    }

    /// Converts a returned reference; only strings are representable.
    unsafe fn object_result(&self, obj: jobject) -> Result<JavaValue, NativeFailure> {
        if obj.is_null() {
            return Ok(JavaValue::Null);
        }
        let text = self.string_value(obj);
        self.delete_local(obj);
        text.map(JavaValue::String)
    }

    unsafe fn new_string(&self, value: &str) -> Result<jstring, NativeFailure> {
        let env = self.0;
        let c_value = java_cstring(value);
        let string = jni_fn!(env, NewStringUTF)(env, c_value.as_ptr());
        if string.is_null() {
            return Err(self.take_exception("NewStringUTF failed"));
        }
        Ok(string)
    }

    unsafe fn string_value(&self, string: jstring) -> Result<String, NativeFailure> {
        let env = self.0;
        let chars = jni_fn!(env, GetStringUTFChars)(env, string, ptr::null_mut());
        if chars.is_null() {
            return Err(self.take_exception("GetStringUTFChars failed"));
        }
        let value = from_java_chars(CStr::from_ptr(chars).to_bytes());
        jni_fn!(env, ReleaseStringUTFChars)(env, string, chars);
        value
    }

    unsafe fn delete_local(&self, obj: jobject) {
        if obj.is_null() {
            return;
        }
        if let Some(delete) = (**self.0).DeleteLocalRef {
            delete(self.0, obj);
        }
    }

    /// `Err` with the pending exception's description, if one is pending.
    unsafe fn check_exception(&self, what: &str) -> Result<(), NativeFailure> {
        let env = self.0;
        if jni_fn!(env, ExceptionCheck)(env) == JNI_FALSE {
            return Ok(());
        }
        Err(self.take_exception(what))
    }

    /// Clears the pending exception (if any) and describes it.
    unsafe fn take_exception(&self, what: &str) -> NativeFailure {
        match self.describe_pending() {
            Some(description) => NativeFailure::new(StatusCode::Err, format!("{}: {}", what, description)),
            None => NativeFailure::new(StatusCode::Err, what.to_string()),
        }
    }

    unsafe fn describe_pending(&self) -> Option<String> {
        let env = self.0;
        let occurred = (**env).ExceptionOccurred?;
        let clear = (**env).ExceptionClear?;
        let throwable = occurred(env);
        if throwable.is_null() {
            return None;
        }
        clear(env);
        let description = self.to_string_call(throwable);
        if (**env).ExceptionCheck.map(|check| check(env) != JNI_FALSE).unwrap_or(false) {
            clear(env);
        }
        self.delete_local(throwable);
        Some(description.unwrap_or_else(|| "java exception (no description available)".to_string()))
    }

    /// `obj.toString()`, without raising.
    unsafe fn to_string_call(&self, obj: jobject) -> Option<String> {
        let env = self.0;
        let get_class = (**env).GetObjectClass?;
        let get_method = (**env).GetMethodID?;
        let call_object = (**env).CallObjectMethodA?;
        let clazz = get_class(env, obj);
        if clazz.is_null() {
            return None;
        }
        let name = CString::new("toString").ok()?;
        let sig = CString::new("()Ljava/lang/String;").ok()?;
        let method_id = get_method(env, clazz, name.as_ptr(), sig.as_ptr());
        self.delete_local(clazz);
        if method_id.is_null() {
            return None;
        }
        let string = call_object(env, obj, method_id, ptr::null());
        if string.is_null() {
            return None;
        }
        let text = self.string_value(string).ok();
        self.delete_local(string);
        text
    }
}

/// Encodes `value` as modified UTF-8. The encoding never contains a zero
/// byte, so any Rust string (embedded NULs included) converts.
fn java_cstring(value: &str) -> CString {
    let mut bytes = to_java_cesu8(value).into_owned();
    bytes.push(0);
    // SAFETY: modified UTF-8 writes U+0000 as 0xC0 0x80, so the only zero
    // byte is the terminator pushed above.
    unsafe { CString::from_vec_with_nul_unchecked(bytes) }
}

/// Decodes modified UTF-8 returned by `GetStringUTFChars`.
fn from_java_chars(bytes: &[u8]) -> Result<String, NativeFailure> {
    from_java_cesu8(bytes)
        .map(|text| text.into_owned())
        .map_err(|err| NativeFailure::new(StatusCode::Err, format!("JVM returned malformed modified UTF-8: {}", err)))
}
