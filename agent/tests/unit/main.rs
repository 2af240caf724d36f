mod support;

mod test_poller;
mod test_sync;
