//! Core type definitions for the depacketization layer.
//!
//! Provides zero-cost newtypes so that stream ids, transport sequence numbers,
//! transport timestamps and picture identifiers cannot be mixed up.
//! All types use `#[repr(transparent)]`.

use std::fmt;
use std::ops::{Add, AddAssign, Deref, Sub};

use serde::{Deserialize, Serialize};

/// Macro to generate newtype wrappers with common implementations
macro_rules! depack_newtype {
    (
        $(#[$meta:meta])*
        $name:ident($inner:ty) => $prefix:literal
        $(, custom_methods: { $($custom:tt)* })?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[derive(Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            /// Creates a new instance
            #[inline]
            pub const fn new(value: $inner) -> Self {
                Self(value)
            }

            /// Raw value
            #[inline]
            pub const fn value(self) -> $inner {
                self.0
            }

            /// Wrapping addition
            #[inline]
            pub const fn wrapping_add(self, rhs: $inner) -> Self {
                Self(self.0.wrapping_add(rhs))
            }

            /// Wrapping subtraction returning the inner type
            #[inline]
            pub const fn wrapping_sub(self, rhs: Self) -> $inner {
                self.0.wrapping_sub(rhs.0)
            }

            $($($custom)*)?
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl Deref for $name {
            type Target = $inner;

            #[inline]
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl From<$inner> for $name {
            #[inline]
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $inner {
            #[inline]
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl PartialEq<$inner> for $name {
            #[inline]
            fn eq(&self, other: &$inner) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<$name> for $inner {
            #[inline]
            fn eq(&self, other: &$name) -> bool {
                *self == other.0
            }
        }

        impl Add<$inner> for $name {
            type Output = Self;

            #[inline]
            fn add(self, rhs: $inner) -> Self::Output {
                self.wrapping_add(rhs)
            }
        }

        impl AddAssign<$inner> for $name {
            #[inline]
            fn add_assign(&mut self, rhs: $inner) {
                *self = self.wrapping_add(rhs);
            }
        }

        impl Sub<Self> for $name {
            type Output = $inner;

            #[inline]
            fn sub(self, rhs: Self) -> Self::Output {
                self.wrapping_sub(rhs)
            }
        }
    };
}

depack_newtype!(
    /// Identifier of one elementary stream within a session.
    StreamId(u32) => "SID"
);

depack_newtype!(
    /// Transport (RTP) sequence number with modulo 2^16 arithmetic.
    SequenceNumber(u16) => "SN",
    custom_methods: {
        /// Signed distance from `reference` to `self`, modulo 2^16.
        ///
        /// Differences in `[0, 32767]` are "forward", anything else is "backward".
        #[inline]
        pub const fn signed_diff(self, reference: SequenceNumber) -> i16 {
            self.0.wrapping_sub(reference.0) as i16
        }

        /// The sequence number that directly follows this one.
        #[inline]
        pub const fn next(self) -> Self {
            self.wrapping_add(1)
        }
    }
);

depack_newtype!(
    /// Transport (RTP) timestamp in media clock units.
    Timestamp(u32) => "TS",
    custom_methods: {
        /// Calculates the wrapping difference between this timestamp and another.
        #[inline]
        pub const fn wrapping_diff(self, other: Timestamp) -> u32 {
            self.0.wrapping_sub(other.0)
        }
    }
);

/// Declared bit width of an explicit picture identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PictureIdWidth {
    /// 7-bit identifier (single octet form).
    Short,
    /// 15-bit identifier (extended two octet form).
    Long,
}

impl PictureIdWidth {
    /// Mask covering every valid identifier of this width.
    #[inline]
    pub const fn mask(self) -> u16 {
        match self {
            PictureIdWidth::Short => 0x7F,
            PictureIdWidth::Long => 0x7FFF,
        }
    }
}

/// Explicit picture identifier carried in a payload descriptor.
///
/// Arithmetic is modulo the declared width, not modulo 2^16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PictureId {
    /// Identifier value, always within `width.mask()`.
    pub value: u16,
    /// Declared bit width.
    pub width: PictureIdWidth,
}

impl PictureId {
    /// Creates a picture id, masking `value` to the declared width.
    #[inline]
    pub const fn new(value: u16, width: PictureIdWidth) -> Self {
        Self {
            value: value & width.mask(),
            width,
        }
    }

    /// The identifier expected for the next picture, using `width` for the wrap.
    ///
    /// `width` comes from the packet being checked since senders may switch
    /// between the short and long form mid-stream.
    #[inline]
    pub const fn successor(self, width: PictureIdWidth) -> Self {
        Self::new(self.value.wrapping_add(1), width)
    }
}

impl fmt::Display for PictureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID{}", self.value)
    }
}
