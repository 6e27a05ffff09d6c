//! Conversion failures, source failures and protocol misuse

mod common;

use common::{entity_row, init_tracing, malformed_row, TestEntity};
use prism_stream::{EntityStream, Next, StreamConfig, StreamError};

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn connection_reset() -> std::io::Error {
        std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        )
    }

    #[tokio::test]
    async fn test_conversion_failure_surfaces_on_its_row() {
        init_tracing();
        let (stream, sink) = EntityStream::<TestEntity>::typed(StreamConfig::default());
        sink.send_row(entity_row(1, "John"));
        sink.send_row(malformed_row("Jane"));

        assert_eq!(
            stream.next().await.unwrap(),
            Next::Value(TestEntity::build(1, "John"))
        );
        match stream.next().await {
            Err(err) => {
                let conversion = err.conversion_error().expect("not a conversion error");
                assert_eq!(conversion.column.as_deref(), Some("id"));
            }
            other => panic!("expected conversion error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fatal_conversion_failure_is_terminal() {
        let (stream, sink) = EntityStream::<TestEntity>::typed(StreamConfig::default());
        sink.send_row(malformed_row("John"));
        sink.send_row(entity_row(2, "Jane"));
        sink.complete();

        for _ in 0..3 {
            let err = stream.next().await.unwrap_err();
            assert!(matches!(err, StreamError::FatalConversion(_)));
            assert!(err.is_terminal());
        }
        assert!(sink.is_closed());
        assert_eq!(stream.stats().rows_discarded, 1);
    }

    #[tokio::test]
    async fn test_per_row_conversion_failure_continues() {
        let (stream, sink) = EntityStream::<TestEntity>::typed(StreamConfig::per_row());
        sink.send_row(entity_row(1, "John"));
        sink.send_row(malformed_row("Broken"));
        sink.send_row(entity_row(3, "Jane"));
        sink.complete();

        assert_eq!(
            stream.next().await.unwrap(),
            Next::Value(TestEntity::build(1, "John"))
        );
        let err = stream.next().await.unwrap_err();
        assert!(matches!(err, StreamError::Conversion(_)));
        assert!(!err.is_terminal());
        assert_eq!(
            stream.next().await.unwrap(),
            Next::Value(TestEntity::build(3, "Jane"))
        );
        assert_eq!(stream.next().await.unwrap(), Next::Finished);
        assert_eq!(stream.stats().conversion_failures, 1);
    }

    #[tokio::test]
    async fn test_conversion_failure_reaches_waiting_request() {
        let (stream, sink) = EntityStream::<TestEntity>::typed(StreamConfig::per_row());
        let request = tokio::spawn(stream.next());
        tokio::task::yield_now().await;

        sink.send_row(malformed_row("John"));
        let result = request.await.expect("request task panicked");
        assert!(result.unwrap_err().is_conversion());
    }

    #[tokio::test]
    async fn test_source_failure_after_rows() {
        let (stream, sink) = EntityStream::<TestEntity>::typed(StreamConfig::default());
        sink.send_row(entity_row(1, "John"));
        sink.fail(connection_reset());

        // rows received before the failure are still delivered
        assert_eq!(
            stream.next().await.unwrap(),
            Next::Value(TestEntity::build(1, "John"))
        );
        for _ in 0..3 {
            let err = stream.next().await.unwrap_err();
            assert!(err.is_source());
            assert!(err.to_string().contains("connection reset by peer"));
        }
    }

    #[tokio::test]
    async fn test_source_failure_reaches_waiting_request() {
        let (stream, sink) = EntityStream::<TestEntity>::typed(StreamConfig::default());
        let request = tokio::spawn(stream.next());
        tokio::task::yield_now().await;

        sink.fail(connection_reset());
        let result = request.await.expect("request task panicked");
        assert!(result.unwrap_err().is_source());

        // a later completion does not turn the failure into a clean end
        sink.complete();
        assert!(stream.next().await.unwrap_err().is_source());
    }

    #[tokio::test]
    async fn test_clean_end_is_distinguishable_from_failure() {
        let (clean, clean_sink) = EntityStream::<TestEntity>::typed(StreamConfig::default());
        clean_sink.complete();
        let (failed, failed_sink) = EntityStream::<TestEntity>::typed(StreamConfig::default());
        failed_sink.fail(connection_reset());

        assert_eq!(clean.next().await.unwrap(), Next::Finished);
        assert!(failed.next().await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_misuse_in_strict_mode() {
        let (stream, sink) = EntityStream::<TestEntity>::typed(StreamConfig::default());
        let first = tokio::spawn(stream.next());
        tokio::task::yield_now().await;

        let second = stream.next().await.unwrap_err();
        assert!(second.is_protocol_misuse());
        assert!(!second.is_terminal());

        // the outstanding request still gets the next row
        sink.send_row(entity_row(1, "John"));
        assert_eq!(
            first.await.expect("request task panicked").unwrap(),
            Next::Value(TestEntity::build(1, "John"))
        );
        assert_eq!(stream.stats().rows_delivered, 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_served_fifo_when_lenient() {
        let config = StreamConfig {
            strict_protocol: false,
            ..Default::default()
        };
        let (stream, sink) = EntityStream::<TestEntity>::typed(config);
        let first = tokio::spawn(stream.next());
        tokio::task::yield_now().await;
        let second = tokio::spawn(stream.next());
        tokio::task::yield_now().await;

        sink.send_row(entity_row(1, "John"));
        sink.complete();

        assert_eq!(
            first.await.expect("request task panicked").unwrap(),
            Next::Value(TestEntity::build(1, "John"))
        );
        assert_eq!(
            second.await.expect("request task panicked").unwrap(),
            Next::Finished
        );
    }
}
