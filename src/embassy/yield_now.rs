use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

/// Lets the executor run other tasks once before continuing.
///
/// The category run loops call this between polls so that a transition tick
/// never starves message handling on a single-threaded executor.
#[inline]
pub async fn yield_now() {
    YieldNow { yielded: false }.await
}

struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    /// # Algorithm
    /// 1. First poll: remember it, wake ourselves and return `Pending`
    /// 2. Any later poll: `Ready`
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.yielded {
            return Poll::Ready(());
        }

        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::task::{RawWaker, RawWakerVTable, Waker};
    use std::sync::atomic::{AtomicUsize, Ordering};

    static WAKES: AtomicUsize = AtomicUsize::new(0);

    static VTABLE: RawWakerVTable = RawWakerVTable::new(
        |_| RawWaker::new(core::ptr::null(), &VTABLE),
        |_| {
            WAKES.fetch_add(1, Ordering::SeqCst);
        },
        |_| {
            WAKES.fetch_add(1, Ordering::SeqCst);
        },
        |_| {},
    );

    fn counting_waker() -> Waker {
        unsafe { Waker::from_raw(RawWaker::new(core::ptr::null(), &VTABLE)) }
    }

    #[test]
    fn test_yield_pends_once_and_wakes() {
        // Arrange
        let waker = counting_waker();
        let mut cx = Context::from_waker(&waker);
        let mut fut = YieldNow { yielded: false };
        let before = WAKES.load(Ordering::SeqCst);

        // Act / Assert
        assert_eq!(Pin::new(&mut fut).poll(&mut cx), Poll::Pending);
        assert!(WAKES.load(Ordering::SeqCst) > before);
        assert_eq!(Pin::new(&mut fut).poll(&mut cx), Poll::Ready(()));
    }

    #[test]
    fn test_yield_now_completes_under_executor() {
        futures::executor::block_on(yield_now());
    }
}
