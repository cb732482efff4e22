//! JavaScript value representation
//!
//! Two value forms exist. [`JsValue`] is what Rust code holds: object
//! references in it are pinned [`Gc`] handles, so they stay alive across
//! allocations. [`HeapValue`] is what heap cells store: object references are
//! plain [`ObjectId`] edges that only the tracing collector follows.

use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::ast::FunctionData;
use crate::error::JsError;
use crate::gc::{Gc, Heap, ObjectId, Trace};
use crate::interpreter::Interpreter;
use crate::lexer::{is_line_terminator, is_whitespace};

/// Trait for types that have cheap (O(1), reference-counted) clones.
///
/// Makes it explicit at the call site that a clone only bumps a reference
/// count (or a pin count) instead of copying data.
pub trait CheapClone: Clone {
    fn cheap_clone(&self) -> Self {
        self.clone()
    }
}

impl<T: ?Sized> CheapClone for Rc<T> {}

/// A JavaScript value
#[derive(Clone, Default)]
pub enum JsValue {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Object(JsObjectRef),
}

impl JsValue {
    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }

    pub fn is_null_or_undefined(&self) -> bool {
        matches!(self, JsValue::Null | JsValue::Undefined)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JsValue::Object(_))
    }

    pub fn as_object(&self) -> Option<&JsObjectRef> {
        match self {
            JsValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            JsValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&JsString> {
        match self {
            JsValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Check if this value is callable (a function)
    pub fn is_callable(&self) -> bool {
        match self {
            JsValue::Object(obj) => obj.borrow().is_callable(),
            _ => false,
        }
    }

    /// Get the typeof result for this value
    pub fn type_of(&self) -> &'static str {
        match self {
            JsValue::Undefined => "undefined",
            JsValue::Null => "object",
            JsValue::Boolean(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
            JsValue::Object(obj) => {
                if obj.borrow().is_callable() {
                    "function"
                } else {
                    "object"
                }
            }
        }
    }

    /// ToBoolean
    pub fn to_boolean(&self) -> bool {
        match self {
            JsValue::Undefined | JsValue::Null => false,
            JsValue::Boolean(b) => *b,
            JsValue::Number(n) => *n != 0.0 && !n.is_nan(),
            JsValue::String(s) => !s.is_empty(),
            JsValue::Object(_) => true,
        }
    }

    /// ToNumber for primitives. Objects yield NaN here; the interpreter runs
    /// ToPrimitive on them first.
    pub fn primitive_to_number(&self) -> f64 {
        match self {
            JsValue::Undefined => f64::NAN,
            JsValue::Null => 0.0,
            JsValue::Boolean(true) => 1.0,
            JsValue::Boolean(false) => 0.0,
            JsValue::Number(n) => *n,
            JsValue::String(s) => string_to_number(s.as_str()),
            JsValue::Object(_) => f64::NAN,
        }
    }

    /// ToString for primitives. Objects are the interpreter's business.
    pub fn primitive_to_string(&self) -> JsString {
        match self {
            JsValue::Undefined => JsString::from("undefined"),
            JsValue::Null => JsString::from("null"),
            JsValue::Boolean(true) => JsString::from("true"),
            JsValue::Boolean(false) => JsString::from("false"),
            JsValue::Number(n) => JsString::from(number_to_string(*n)),
            JsValue::String(s) => s.cheap_clone(),
            JsValue::Object(_) => JsString::from("[object Object]"),
        }
    }

    /// Strict equality (===)
    pub fn strict_equals(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) => true,
            (JsValue::Null, JsValue::Null) => true,
            (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
            // NaN !== NaN, and 0 === -0
            (JsValue::Number(a), JsValue::Number(b)) => a == b,
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Object(a), JsValue::Object(b)) => Gc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "undefined"),
            JsValue::Null => write!(f, "null"),
            JsValue::Boolean(b) => write!(f, "{}", b),
            JsValue::Number(n) => write!(f, "{}", number_to_string(*n)),
            JsValue::String(s) => write!(f, "\"{}\"", s.as_str()),
            JsValue::Object(obj) => {
                let obj = obj.borrow();
                match &obj.kind {
                    ObjectKind::Function(func) => {
                        let name = func.name().map(|n| n.to_string());
                        write!(f, "[Function: {}]", name.as_deref().unwrap_or("anonymous"))
                    }
                    _ => write!(f, "[object {}]", obj.class.name()),
                }
            }
        }
    }
}

impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        JsValue::Boolean(b)
    }
}

impl From<f64> for JsValue {
    fn from(n: f64) -> Self {
        JsValue::Number(n)
    }
}

impl From<i32> for JsValue {
    fn from(n: i32) -> Self {
        JsValue::Number(f64::from(n))
    }
}

impl From<u32> for JsValue {
    fn from(n: u32) -> Self {
        JsValue::Number(f64::from(n))
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        JsValue::String(JsString::from(s))
    }
}

impl From<String> for JsValue {
    fn from(s: String) -> Self {
        JsValue::String(JsString::from(s))
    }
}

impl From<JsString> for JsValue {
    fn from(s: JsString) -> Self {
        JsValue::String(s)
    }
}

impl From<JsObjectRef> for JsValue {
    fn from(obj: JsObjectRef) -> Self {
        JsValue::Object(obj)
    }
}

/// A value as stored inside a heap cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum HeapValue {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Object(ObjectId),
}

impl HeapValue {
    /// Lift into a [`JsValue`], pinning the referenced object.
    pub fn to_value(&self, heap: &Heap<JsObject>) -> JsValue {
        match self {
            HeapValue::Undefined => JsValue::Undefined,
            HeapValue::Null => JsValue::Null,
            HeapValue::Boolean(b) => JsValue::Boolean(*b),
            HeapValue::Number(n) => JsValue::Number(*n),
            HeapValue::String(s) => JsValue::String(s.cheap_clone()),
            HeapValue::Object(id) => JsValue::Object(heap.pin(*id)),
        }
    }

    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            HeapValue::Object(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<&JsValue> for HeapValue {
    fn from(value: &JsValue) -> Self {
        match value {
            JsValue::Undefined => HeapValue::Undefined,
            JsValue::Null => HeapValue::Null,
            JsValue::Boolean(b) => HeapValue::Boolean(*b),
            JsValue::Number(n) => HeapValue::Number(*n),
            JsValue::String(s) => HeapValue::String(s.cheap_clone()),
            JsValue::Object(obj) => HeapValue::Object(obj.id()),
        }
    }
}

impl From<JsValue> for HeapValue {
    fn from(value: JsValue) -> Self {
        HeapValue::from(&value)
    }
}

/// Immutable shared string.
///
/// Stored as UTF-8, while script-visible lengths and indices count UTF-16
/// code units. A surrogate pair round-trips as one code point, but a lone
/// surrogate (`String.fromCharCode(0xD800)`) cannot be represented and is
/// stored as U+FFFD, so reading it back gives 0xFFFD.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsString(Rc<str>);

impl CheapClone for JsString {}

impl JsString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Byte length of the UTF-8 representation
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Length in UTF-16 code units, the unit `String.prototype.length` counts.
    pub fn utf16_len(&self) -> usize {
        self.0.encode_utf16().count()
    }

    pub fn code_unit_at(&self, index: usize) -> Option<u16> {
        self.0.encode_utf16().nth(index)
    }

    pub fn to_utf16(&self) -> Vec<u16> {
        self.0.encode_utf16().collect()
    }

    /// Build from UTF-16 code units; lone surrogates become U+FFFD.
    pub fn from_utf16(units: &[u16]) -> Self {
        JsString::from(String::from_utf16_lossy(units))
    }
}

impl AsRef<str> for JsString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for JsString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for JsString {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for JsString {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        JsString(s.into())
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        JsString(s.into())
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add<&str> for JsString {
    type Output = JsString;

    fn add(self, other: &str) -> JsString {
        let mut s = String::from(&*self.0);
        s.push_str(other);
        JsString::from(s)
    }
}

impl std::ops::Add<&JsString> for JsString {
    type Output = JsString;

    fn add(self, other: &JsString) -> JsString {
        let mut s = String::from(&*self.0);
        s.push_str(&other.0);
        JsString::from(s)
    }
}

/// Pinned reference to a heap object
pub type JsObjectRef = Gc<JsObject>;

impl<T: Trace> CheapClone for Gc<T> {}

bitflags! {
    /// Property attributes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PropertyAttributes: u8 {
        /// Assignment is silently ignored
        const READ_ONLY = 1;
        /// Skipped by `for-in`
        const DONT_ENUM = 1 << 1;
        /// `delete` fails
        const DONT_DELETE = 1 << 2;
        /// Host-only slot, invisible to scripts
        const INTERNAL = 1 << 3;
    }
}

impl PropertyAttributes {
    /// Attributes of built-in methods and constants on prototypes
    pub const BUILTIN: PropertyAttributes = PropertyAttributes::DONT_ENUM;
    /// Attributes of `length` on functions and constants like `Math.PI`
    pub const FIXED: PropertyAttributes = PropertyAttributes::READ_ONLY
        .union(PropertyAttributes::DONT_ENUM)
        .union(PropertyAttributes::DONT_DELETE);
}

/// An own property
#[derive(Debug, Clone)]
pub struct Property {
    pub value: HeapValue,
    pub attributes: PropertyAttributes,
}

impl Property {
    pub fn new(value: HeapValue, attributes: PropertyAttributes) -> Self {
        Self { value, attributes }
    }

    pub fn is_read_only(&self) -> bool {
        self.attributes.contains(PropertyAttributes::READ_ONLY)
    }

    pub fn is_enumerable(&self) -> bool {
        !self
            .attributes
            .intersects(PropertyAttributes::DONT_ENUM | PropertyAttributes::INTERNAL)
    }

    pub fn is_deletable(&self) -> bool {
        !self.attributes.contains(PropertyAttributes::DONT_DELETE)
    }

    pub fn is_internal(&self) -> bool {
        self.attributes.contains(PropertyAttributes::INTERNAL)
    }
}

/// Property map keyed by name, kept in insertion order for `for-in`
pub type PropertyMap = IndexMap<JsString, Property, FxBuildHasher>;

/// Built-in kind of an object, reported by `Object.prototype.toString`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectClass {
    #[default]
    Object,
    Function,
    Array,
    Arguments,
    Activation,
    Error,
    Boolean,
    Number,
    String,
    Global,
    Math,
}

impl ObjectClass {
    pub fn name(self) -> &'static str {
        match self {
            ObjectClass::Object => "Object",
            ObjectClass::Function => "Function",
            ObjectClass::Array => "Array",
            ObjectClass::Arguments => "Arguments",
            ObjectClass::Activation => "Activation",
            ObjectClass::Error => "Error",
            ObjectClass::Boolean => "Boolean",
            ObjectClass::Number => "Number",
            ObjectClass::String => "String",
            ObjectClass::Global => "global",
            ObjectClass::Math => "Math",
        }
    }
}

/// Signature of host functions callable from scripts.
///
/// Receives the interpreter, the `this` value and the arguments.
pub type NativeFn = fn(&mut Interpreter, JsValue, &[JsValue]) -> Result<JsValue, JsError>;

/// Native function wrapper
#[derive(Clone)]
pub struct NativeFunction {
    pub name: JsString,
    pub arity: usize,
    pub call: NativeFn,
    /// Behavior under `new`; `None` makes `new` a TypeError
    pub construct: Option<NativeFn>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("constructor", &self.construct.is_some())
            .finish()
    }
}

/// A function defined in script
#[derive(Debug, Clone)]
pub struct ScriptFunction {
    pub code: Rc<FunctionData>,
    /// Captured scope chain, innermost last
    pub scope: Vec<ObjectId>,
}

#[derive(Debug, Clone)]
pub enum FunctionKind {
    Script(ScriptFunction),
    Native(NativeFunction),
}

impl FunctionKind {
    pub fn name(&self) -> Option<&JsString> {
        match self {
            FunctionKind::Script(func) => func.code.name.as_ref(),
            FunctionKind::Native(func) => Some(&func.name),
        }
    }
}

/// The `arguments` object of one call.
#[derive(Debug, Clone)]
pub struct ArgumentsData {
    pub activation: ObjectId,
    /// Parameter name aliased by each index, `None` once unmapped
    pub mapped: Vec<Option<JsString>>,
}

impl ArgumentsData {
    /// Parameter aliased by the property `name`, if any
    pub fn mapped_name(&self, name: &str) -> Option<&JsString> {
        let index = array_index(name)?;
        self.mapped.get(index as usize)?.as_ref()
    }

    pub fn unmap(&mut self, name: &str) {
        if let Some(slot) = array_index(name).and_then(|i| self.mapped.get_mut(i as usize)) {
            *slot = None;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum ObjectKind {
    #[default]
    Ordinary,
    Function(FunctionKind),
    Arguments(ArgumentsData),
}

/// A JavaScript object
#[derive(Debug, Default)]
pub struct JsObject {
    pub class: ObjectClass,
    /// Prototype link; `None` is a null prototype
    pub prototype: Option<ObjectId>,
    pub properties: PropertyMap,
    /// Primitive held by wrapper objects (`new Number(1)`)
    pub internal: Option<HeapValue>,
    pub kind: ObjectKind,
}

impl JsObject {
    pub fn new(class: ObjectClass, prototype: Option<ObjectId>) -> Self {
        Self {
            class,
            prototype,
            properties: PropertyMap::default(),
            internal: None,
            kind: ObjectKind::Ordinary,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    pub fn function(&self) -> Option<&FunctionKind> {
        match &self.kind {
            ObjectKind::Function(func) => Some(func),
            _ => None,
        }
    }

    /// Own property visible to scripts
    pub fn get_own(&self, name: &str) -> Option<&Property> {
        self.properties.get(name).filter(|prop| !prop.is_internal())
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.get_own(name).is_some()
    }

    /// Install a property directly, replacing any existing one regardless of
    /// its attributes. Used while building objects.
    pub fn define(&mut self, name: JsString, value: HeapValue, attributes: PropertyAttributes) {
        self.properties.insert(name, Property::new(value, attributes));
    }

    /// Remove an own property keeping the order of the others
    pub fn remove(&mut self, name: &str) -> Option<Property> {
        self.properties.shift_remove(name)
    }
}

impl Trace for JsObject {
    fn trace(&self, visit: &mut dyn FnMut(ObjectId)) {
        if let Some(proto) = self.prototype {
            visit(proto);
        }
        for prop in self.properties.values() {
            if let HeapValue::Object(id) = prop.value {
                visit(id);
            }
        }
        if let Some(HeapValue::Object(id)) = self.internal {
            visit(id);
        }
        match &self.kind {
            ObjectKind::Ordinary | ObjectKind::Function(FunctionKind::Native(_)) => {}
            ObjectKind::Function(FunctionKind::Script(func)) => {
                for id in &func.scope {
                    visit(*id);
                }
            }
            ObjectKind::Arguments(args) => visit(args.activation),
        }
    }

    fn size_hint(&self) -> usize {
        let scope = match &self.kind {
            ObjectKind::Function(FunctionKind::Script(func)) => func.scope.len(),
            _ => 0,
        };
        1 + self.properties.len() + scope
    }
}

// ============================================================================
// Conversions
// ============================================================================

/// Number::toString for radix 10
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n < 0.0 {
        return format!("-{}", number_to_string(-n));
    }

    // `{:e}` yields the shortest digit string that round-trips
    let formatted = format!("{:e}", n);
    let (mantissa, exponent) = formatted
        .split_once('e')
        .unwrap_or((formatted.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let point = exponent.parse::<i32>().unwrap_or(0) + 1;

    if k <= point && point <= 21 {
        let mut out = digits;
        out.extend(std::iter::repeat_n('0', (point - k) as usize));
        out
    } else if 0 < point && point <= 21 {
        let (int_part, frac_part) = digits.split_at(point as usize);
        format!("{}.{}", int_part, frac_part)
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat((-point) as usize), digits)
    } else {
        let sign = if point - 1 < 0 { '-' } else { '+' };
        let exp = (point - 1).abs();
        let mut chars = digits.chars();
        let first = chars.next().unwrap_or('0');
        let rest: String = chars.collect();
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, exp)
        } else {
            format!("{}.{}e{}{}", first, rest, sign, exp)
        }
    }
}

/// Number::toString for radix 2..=36
pub fn number_to_radix_string(n: f64, radix: u32) -> String {
    if radix == 10 || !n.is_finite() {
        return number_to_string(n);
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let negative = n < 0.0;
    let n = libm::fabs(n);
    let mut integer = libm::floor(n);
    let mut fraction = n - integer;
    let base = f64::from(radix);

    let mut int_digits = Vec::new();
    if integer == 0.0 {
        int_digits.push('0');
    }
    while integer >= 1.0 {
        let digit = libm::fmod(integer, base) as u32;
        int_digits.push(std::char::from_digit(digit, radix).unwrap_or('0'));
        integer = libm::floor(integer / base);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.extend(int_digits.iter().rev());

    if fraction > 0.0 {
        out.push('.');
        // 52 fractional digits exhaust a double's precision in any radix >= 2
        for _ in 0..52 {
            fraction *= base;
            let digit = libm::floor(fraction);
            fraction -= digit;
            out.push(std::char::from_digit(digit as u32, radix).unwrap_or('0'));
            if fraction == 0.0 {
                break;
            }
        }
    }
    out
}

/// ToNumber applied to a string
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(|c| is_whitespace(c) || is_line_terminator(c));
    if trimmed.is_empty() {
        return 0.0;
    }

    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        if hex.is_empty() {
            return f64::NAN;
        }
        let mut value = 0.0;
        for c in hex.chars() {
            match c.to_digit(16) {
                Some(d) => value = value * 16.0 + f64::from(d),
                None => return f64::NAN,
            }
        }
        return value;
    }

    let (sign, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1.0, trimmed.get(1..).unwrap_or("")),
        Some(b'+') => (1.0, trimmed.get(1..).unwrap_or("")),
        _ => (1.0, trimmed),
    };
    if unsigned == "Infinity" {
        return sign * f64::INFINITY;
    }
    // One sign only; the float parser would take a second one
    if unsigned.starts_with(['+', '-']) {
        return f64::NAN;
    }

    // Rust's float parser also accepts "inf" and "nan", which are not numeric
    // literals here
    let valid = unsigned.chars().any(|c| c.is_ascii_digit())
        && unsigned
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !valid {
        return f64::NAN;
    }
    match unsigned.parse::<f64>() {
        Ok(value) => sign * value,
        Err(_) => f64::NAN,
    }
}

/// ToInteger
pub fn to_integer(n: f64) -> f64 {
    if n.is_nan() {
        0.0
    } else if n.is_infinite() || n == 0.0 {
        n
    } else {
        libm::trunc(n)
    }
}

/// ToUint32
pub fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    let two_32 = 4_294_967_296.0;
    let wrapped = libm::trunc(n).rem_euclid(two_32);
    wrapped as u32
}

/// ToInt32
pub fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

/// ToUint16
pub fn to_uint16(n: f64) -> u16 {
    to_uint32(n) as u16
}

/// Parse a canonical array index ("0", "17", not "017" or "4294967295").
pub fn array_index(name: &str) -> Option<u32> {
    let bytes = name.as_bytes();
    match bytes {
        [] => return None,
        [b'0'] => return Some(0),
        [b'0', ..] => return None,
        _ => {}
    }
    if !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let index = name.parse::<u32>().ok()?;
    (index != u32::MAX).then_some(index)
}
