// Handler signatures and their type-erased invocation
//
// Any plain function or closure whose signature fits one of the supported
// shapes is a handler:
// - zero or one parameter: nothing, `Values`, `String` or a record
// - zero, one or two results: nothing, a text or record value, optionally
//   paired with an error (`Result<T, E>` or `(T, Option<E>)`)
// - optionally bound to a receiver, as `Method::new(receiver, func)`
//
// Parameter counts and result types are checked by the trait bounds below,
// so an unsupported signature fails to compile. Which parameter kinds each
// HTTP method accepts is checked at registration time.

use crate::binder::Argument;
use crate::record::Record;
use crate::serializer::{ReturnValue, ReturnValues};
use crate::shape::{OutputShape, ParamKind, ReturnKind};
use crate::{Error, Values};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::{self, Display};
use std::marker::PhantomData;
use std::sync::Arc;

/// A type a handler can take as its parameter.
pub trait Param: Sized + Send + 'static {
    const KIND: ParamKind;

    /// Build the parameter from the bound argument.
    fn from_argument(argument: Argument) -> Result<Self, Error>;
}

impl Param for Values {
    const KIND: ParamKind = ParamKind::Values;

    fn from_argument(argument: Argument) -> Result<Self, Error> {
        match argument {
            Argument::Values(values) | Argument::Form(values) => Ok(values),
            other => Err(mismatch(<Self as Param>::KIND, &other)),
        }
    }
}

impl Param for String {
    const KIND: ParamKind = ParamKind::Text;

    fn from_argument(argument: Argument) -> Result<Self, Error> {
        match argument {
            Argument::Text(text) => Ok(text),
            other => Err(mismatch(<Self as Param>::KIND, &other)),
        }
    }
}

impl<T> Param for T
where
    T: Record + DeserializeOwned + Default,
{
    const KIND: ParamKind = ParamKind::Record;

    fn from_argument(argument: Argument) -> Result<Self, Error> {
        match argument {
            Argument::Json(document) => Ok(serde_json::from_slice(&document)?),
            Argument::Xml(document) => Ok(quick_xml::de::from_reader(document.as_ref())?),
            Argument::Form(form) => {
                let mut record = T::default();
                record.assign_form(&form);
                Ok(record)
            }
            other => Err(mismatch(<Self as Param>::KIND, &other)),
        }
    }
}

fn mismatch(expected: ParamKind, actual: &Argument) -> Error {
    Error::ArgumentMismatch {
        expected: expected.name(),
        actual: actual.kind_name(),
    }
}

/// A type a handler can return as its first result.
pub trait ReturnItem: Send + 'static {
    const KIND: ReturnKind;

    fn into_return_value(self) -> ReturnValue;
}

impl ReturnItem for String {
    const KIND: ReturnKind = ReturnKind::Text;

    fn into_return_value(self) -> ReturnValue {
        ReturnValue::Text(self)
    }
}

impl ReturnItem for &'static str {
    const KIND: ReturnKind = ReturnKind::Text;

    fn into_return_value(self) -> ReturnValue {
        ReturnValue::Text(self.to_string())
    }
}

impl<T> ReturnItem for T
where
    T: Record + Serialize,
{
    const KIND: ReturnKind = ReturnKind::Record;

    fn into_return_value(self) -> ReturnValue {
        ReturnValue::Record(Box::new(self))
    }
}

/// A missing record is written as JSON `null`.
impl<T> ReturnItem for Option<T>
where
    T: Record + Serialize,
{
    const KIND: ReturnKind = ReturnKind::Record;

    fn into_return_value(self) -> ReturnValue {
        ReturnValue::Record(Box::new(self))
    }
}

impl<T> ReturnItem for Arc<T>
where
    T: Record + Serialize + Sync,
{
    const KIND: ReturnKind = ReturnKind::Record;

    fn into_return_value(self) -> ReturnValue {
        ReturnValue::Record(Box::new(Shared(self)))
    }
}

struct Shared<T>(Arc<T>);

impl<T: Serialize> Serialize for Shared<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_ref().serialize(serializer)
    }
}

/// Everything a handler can return.
pub trait Returns: Send + 'static {
    const SHAPE: OutputShape;

    fn into_return_values(self) -> ReturnValues;
}

impl Returns for () {
    const SHAPE: OutputShape = OutputShape::Empty;

    fn into_return_values(self) -> ReturnValues {
        ReturnValues::empty()
    }
}

impl<T: ReturnItem> Returns for T {
    const SHAPE: OutputShape = OutputShape::Value(T::KIND);

    fn into_return_values(self) -> ReturnValues {
        ReturnValues::value(self.into_return_value())
    }
}

impl<T, E> Returns for Result<T, E>
where
    T: ReturnItem,
    E: Display + Send + 'static,
{
    const SHAPE: OutputShape = OutputShape::Fallible(T::KIND);

    fn into_return_values(self) -> ReturnValues {
        match self {
            Ok(value) => ReturnValues::value(value.into_return_value()),
            Err(err) => ReturnValues::empty().with_error(Some(err.to_string())),
        }
    }
}

/// A value together with an optional error; the error wins when present.
impl<T, E> Returns for (T, Option<E>)
where
    T: ReturnItem,
    E: Display + Send + 'static,
{
    const SHAPE: OutputShape = OutputShape::Fallible(T::KIND);

    fn into_return_values(self) -> ReturnValues {
        let (value, err) = self;
        ReturnValues::value(value.into_return_value()).with_error(err.map(|e| e.to_string()))
    }
}

/// A function bound to a receiver.
///
/// The function is called with a shared reference to the receiver, which is
/// kept alive for as long as the route is registered.
pub struct Method<R, F> {
    receiver: Arc<R>,
    func: F,
}

impl<R, F> Method<R, F> {
    pub fn new(receiver: R, func: F) -> Self {
        Self {
            receiver: Arc::new(receiver),
            func,
        }
    }
}

/// Marker for handler signatures that take a receiver.
pub struct Bound;

/// A function that can be registered as a route handler.
///
/// `Args` only tells the blanket implementations apart; callers never name it.
///
/// ```compile_fail
/// use easyrest_core::{Handler, Values};
///
/// fn assert_handler<H: Handler<M>, M>(_: H) {}
///
/// // Two parameters are never accepted.
/// assert_handler(|a: Values, b: Values| format!("{}{}", a, b));
/// ```
///
/// ```compile_fail
/// use easyrest_core::{Handler, Values};
///
/// fn assert_handler<H: Handler<M>, M>(_: H) {}
///
/// assert_handler(|a: Values, b: String, c: Values| format!("{}{}{}", a, b, c));
/// ```
pub trait Handler<Args>: Send + Sync + Sized + 'static {
    /// Kind of the handler's parameter.
    const PARAM: ParamKind;
    /// What the handler returns.
    const OUTPUT: OutputShape;

    /// Call the handler with its bound argument.
    fn invoke(&self, argument: Option<Argument>) -> Result<ReturnValues, Error>;

    /// Type name of the bound receiver, if any.
    fn receiver_type(&self) -> Option<&'static str> {
        None
    }
}

impl<F, O> Handler<(O,)> for F
where
    F: Fn() -> O + Send + Sync + 'static,
    O: Returns,
{
    const PARAM: ParamKind = ParamKind::None;
    const OUTPUT: OutputShape = O::SHAPE;

    fn invoke(&self, _argument: Option<Argument>) -> Result<ReturnValues, Error> {
        Ok(self().into_return_values())
    }
}

impl<F, P, O> Handler<(P, O)> for F
where
    F: Fn(P) -> O + Send + Sync + 'static,
    P: Param,
    O: Returns,
{
    const PARAM: ParamKind = P::KIND;
    const OUTPUT: OutputShape = O::SHAPE;

    fn invoke(&self, argument: Option<Argument>) -> Result<ReturnValues, Error> {
        let param = P::from_argument(argument.ok_or(Error::MissingArgument)?)?;
        Ok(self(param).into_return_values())
    }
}

impl<R, F, O> Handler<(Bound, O)> for Method<R, F>
where
    R: Send + Sync + 'static,
    F: Fn(&R) -> O + Send + Sync + 'static,
    O: Returns,
{
    const PARAM: ParamKind = ParamKind::None;
    const OUTPUT: OutputShape = O::SHAPE;

    fn invoke(&self, _argument: Option<Argument>) -> Result<ReturnValues, Error> {
        Ok((self.func)(&self.receiver).into_return_values())
    }

    fn receiver_type(&self) -> Option<&'static str> {
        Some(std::any::type_name::<R>())
    }
}

impl<R, F, P, O> Handler<(Bound, P, O)> for Method<R, F>
where
    R: Send + Sync + 'static,
    F: Fn(&R, P) -> O + Send + Sync + 'static,
    P: Param,
    O: Returns,
{
    const PARAM: ParamKind = P::KIND;
    const OUTPUT: OutputShape = O::SHAPE;

    fn invoke(&self, argument: Option<Argument>) -> Result<ReturnValues, Error> {
        let param = P::from_argument(argument.ok_or(Error::MissingArgument)?)?;
        Ok((self.func)(&self.receiver, param).into_return_values())
    }

    fn receiver_type(&self) -> Option<&'static str> {
        Some(std::any::type_name::<R>())
    }
}

/// A registered handler with its signature erased.
///
/// Cloning is cheap; all clones call the same handler.
#[derive(Clone)]
pub struct Invocable {
    inner: Arc<dyn ErasedHandler>,
    receiver_type: Option<&'static str>,
}

impl Invocable {
    pub fn new<H, Args>(handler: H) -> Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        let receiver_type = handler.receiver_type();
        Self {
            inner: Arc::new(HandlerWrapper {
                handler,
                _marker: PhantomData,
            }),
            receiver_type,
        }
    }

    pub fn invoke(&self, argument: Option<Argument>) -> Result<ReturnValues, Error> {
        self.inner.invoke(argument)
    }

    pub fn receiver_type(&self) -> Option<&'static str> {
        self.receiver_type
    }
}

impl fmt::Debug for Invocable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocable")
            .field("receiver_type", &self.receiver_type)
            .finish_non_exhaustive()
    }
}

trait ErasedHandler: Send + Sync {
    fn invoke(&self, argument: Option<Argument>) -> Result<ReturnValues, Error>;
}

struct HandlerWrapper<H, Args> {
    handler: H,
    _marker: PhantomData<fn() -> Args>,
}

impl<H, Args> ErasedHandler for HandlerWrapper<H, Args>
where
    H: Handler<Args>,
    Args: 'static,
{
    fn invoke(&self, argument: Option<Argument>) -> Result<ReturnValues, Error> {
        self.handler.invoke(argument)
    }
}
