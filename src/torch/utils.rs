//! Torch utilities
use tch::{TchError, Tensor};

/// Zero the gradient of a tensor.
pub fn f_zero_grad(x: &Tensor) -> Result<(), TchError> {
    let mut grad = x.f_grad()?;
    if grad.defined() {
        let _ = grad.f_detach_()?;
        let _ = grad.f_zero_()?;
    }
    Ok(())
}

/// Zero the gradient of a tensor.
///
/// # Panics
/// If [`f_zero_grad`] fails.
pub fn zero_grad(x: &Tensor) {
    f_zero_grad(x).unwrap()
}

/// Detached copy of the gradient of a tensor, or zeros if no gradient has been computed.
///
/// The result does not share storage with the gradient buffer.
pub fn detached_grad(x: &Tensor) -> Tensor {
    let grad = x.grad();
    if grad.defined() {
        grad.detach().copy()
    } else {
        x.detach().zeros_like()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::Kind;

    #[test]
    fn zero_grad_after_backward() {
        let x = Tensor::of_slice(&[1.0_f32, 2.0]).set_requires_grad(true);
        (&x * &x).sum(Kind::Float).backward();
        assert_eq!(x.grad(), Tensor::of_slice(&[2.0_f32, 4.0]));
        zero_grad(&x);
        assert_eq!(x.grad(), Tensor::of_slice(&[0.0_f32, 0.0]));
    }

    #[test]
    fn detached_grad_without_backward_is_zeros() {
        let x = Tensor::of_slice(&[1.0_f32, 2.0]).set_requires_grad(true);
        let grad = detached_grad(&x);
        assert_eq!(grad, Tensor::of_slice(&[0.0_f32, 0.0]));
        assert!(!grad.requires_grad());
    }

    #[test]
    fn detached_grad_is_a_copy() {
        let x = Tensor::of_slice(&[3.0_f32]).set_requires_grad(true);
        (&x * 2.0).sum(Kind::Float).backward();
        let grad = detached_grad(&x);
        zero_grad(&x);
        assert_eq!(grad, Tensor::of_slice(&[2.0_f32]));
    }
}
