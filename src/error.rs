//! Types for error handling
//!
//! # Error handling in devalloc
//!
//! Only allocation can fail. Every fallible call returns an [`AllocResult`]; the two variants
//! that make up the standard bad-allocation condition are reported by
//! [`AllocError::is_bad_alloc`]. Deallocation is infallible by contract: handing back a pointer
//! the allocator did not produce is undefined behavior and is never reported as an error.
//!
//! Callers that would rather treat bad allocation as fatal can use
//! [`Allocate::allocate_or_abort`](../allocator/trait.Allocate.html#method.allocate_or_abort).

#[cfg(feature = "cuda")]
use cuda_driver_sys::CUresult;
use thiserror::Error;

/// Error enum which represents all the potential errors returned by devalloc.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum AllocError {
    /// More elements were requested than the allocator's `max_size()`, or the byte count does
    /// not fit the address space. Nothing was allocated.
    #[error("requested {requested} elements, but at most {max_size} can be allocated")]
    SizeExceeded {
        /// The element count asked for.
        requested: usize,
        /// The allocator's upper bound for that element type.
        max_size: usize,
    },

    /// The memory resource backing a space could not satisfy the request.
    #[error("the {space} memory space could not provide {bytes} bytes")]
    OutOfMemory {
        /// Name of the memory space.
        space: &'static str,
        /// Size of the failed request.
        bytes: usize,
    },

    /// A copy between a buffer and a host slice was given slices of different lengths.
    #[error("length mismatch: buffer holds {expected} elements, slice holds {found}")]
    LengthMismatch {
        /// Length of the buffer.
        expected: usize,
        /// Length of the host slice.
        found: usize,
    },

    /// The CUDA driver reported a failure.
    #[cfg(feature = "cuda")]
    #[error("CUDA driver error: {0:?}")]
    Driver(CUresult),
}

impl AllocError {
    /// Returns true for the standard bad-allocation condition: the request was too large, or
    /// memory ran out.
    pub fn is_bad_alloc(&self) -> bool {
        matches!(
            self,
            AllocError::SizeExceeded { .. } | AllocError::OutOfMemory { .. }
        )
    }
}

/// Result type for most devalloc functions.
pub type AllocResult<T> = Result<T, AllocError>;

#[cfg(feature = "cuda")]
pub(crate) trait ToResult {
    fn to_result(self) -> AllocResult<()>;
}

#[cfg(feature = "cuda")]
impl ToResult for CUresult {
    fn to_result(self) -> AllocResult<()> {
        match self {
            CUresult::CUDA_SUCCESS => Ok(()),
            CUresult::CUDA_ERROR_OUT_OF_MEMORY => Err(AllocError::OutOfMemory {
                space: "device",
                bytes: 0,
            }),
            other => Err(AllocError::Driver(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_exceeded_is_bad_alloc() {
        let err = AllocError::SizeExceeded {
            requested: 10,
            max_size: 4,
        };
        assert!(err.is_bad_alloc());
        assert_eq!(
            err.to_string(),
            "requested 10 elements, but at most 4 can be allocated"
        );
    }

    #[test]
    fn out_of_memory_names_the_space() {
        let err = AllocError::OutOfMemory {
            space: "device",
            bytes: 64,
        };
        assert!(err.is_bad_alloc());
        assert!(err.to_string().contains("device"));
    }

    #[test]
    fn length_mismatch_is_not_bad_alloc() {
        let err = AllocError::LengthMismatch {
            expected: 3,
            found: 2,
        };
        assert!(!err.is_bad_alloc());
    }
}
