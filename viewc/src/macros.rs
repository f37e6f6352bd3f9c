// `ok!` and `some!` stand in for `?` in the rewrite passes.  All passes share a
// single error type so no conversion is needed and the plain match expands to
// less code than the try operator.

macro_rules! ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(err) => return Err(err),
        }
    };
}

macro_rules! some {
    ($expr:expr) => {
        match $expr {
            Some(val) => val,
            None => return None,
        }
    };
}
