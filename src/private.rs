//! This module contains private sealed traits that should not be used or implemented outside of
//! devalloc. These traits are public because they are used as bounds in certain functions.
//! These traits may change in any way at any time with no warning, and this will not be considered
//! a breaking change.

use crate::memory::{Device, Host, Unified};

pub trait Sealed {}

impl Sealed for Host {}
impl Sealed for Device {}
impl Sealed for Unified {}
