// Logging under the `impression_tracker` target. Without the `tracing` feature every call site
// expands to nothing, so log-only bindings need `allow(unused_variables)` there.

#[cfg(feature = "tracing")]
macro_rules! ilog {
    ($level:ident, $($tt:tt)*) => {
        tracing::$level!(target: "impression_tracker", $($tt)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! ilog {
    ($level:ident, $($tt:tt)*) => {};
}

macro_rules! itrace {
    ($($tt:tt)*) => { ilog!(trace, $($tt)*) };
}

macro_rules! idebug {
    ($($tt:tt)*) => { ilog!(debug, $($tt)*) };
}

macro_rules! iwarn {
    ($($tt:tt)*) => { ilog!(warn, $($tt)*) };
}
