use std::future::Future;

#[cfg(not(target_family = "wasm"))]
pub(crate) trait MaybeSend: Send {}
#[cfg(not(target_family = "wasm"))]
impl<T: Send> MaybeSend for T {}

#[cfg(target_family = "wasm")]
pub(crate) trait MaybeSend {}
#[cfg(target_family = "wasm")]
impl<T> MaybeSend for T {}

/// Runs `future` to completion without the caller awaiting it.
///
/// Inside a tokio runtime the future is spawned onto it; in the browser it is handed to the
/// JS event loop. Elsewhere it is driven on a dedicated thread.
pub(crate) fn spawn<F>(future: F)
where
    F: Future<Output = ()> + MaybeSend + 'static,
{
    #[cfg(all(feature = "wasm-js", target_family = "wasm"))]
    {
        wasm_bindgen_futures::spawn_local(future);
    }

    #[cfg(not(target_family = "wasm"))]
    {
        #[cfg(feature = "native")]
        {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(future);
                return;
            }
        }
        std::thread::spawn(move || futures::executor::block_on(future));
    }

    #[cfg(all(target_family = "wasm", not(feature = "wasm-js")))]
    {
        futures::executor::block_on(future);
    }
}
