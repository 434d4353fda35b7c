//! End-to-end tests for the file-drop pipeline.
//!
//! Tests: drop file → watcher → dispatcher → pipeline → services → placement
//!
//! Verifies:
//! - Successful documents land in the processed directory and reach the services
//! - Failures land in the right error area with the right message
//! - Files are processed once and `stop()` drains in-flight work

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    use wms_core::ProductCode;
    use wms_parties::{CustomerRequest, CustomerService};
    use wms_products::{Dimensions, ProductRequest, ProductService};

    use crate::config::FileProcessorConfig;
    use crate::error::FailureKind;
    use crate::orchestrator::{FileProcessor, FileProcessorHandle};
    use crate::pipeline::ProcessingOutcome;
    use crate::placement::VALIDATION_ERRORS_DIR;
    use crate::services::InMemoryServiceProvider;

    struct Env {
        _root: tempfile::TempDir,
        config: FileProcessorConfig,
        provider: InMemoryServiceProvider,
    }

    impl Env {
        fn watch(&self) -> &Path {
            &self.config.watch_path
        }

        fn processed(&self) -> &Path {
            &self.config.processed_path
        }

        fn errors(&self) -> &Path {
            &self.config.error_path
        }

        fn validation_errors(&self) -> PathBuf {
            self.config.error_path.join(VALIDATION_ERRORS_DIR)
        }

        fn drop_file(&self, name: &str, xml: &str) -> PathBuf {
            // Write beside the watch directory, then rename in, so the watcher
            // never sees a half-written file.
            let staging = self.watch().parent().unwrap().join(format!("{name}.partial"));
            std::fs::write(&staging, xml).unwrap();
            let path = self.watch().join(name);
            std::fs::rename(&staging, &path).unwrap();
            path
        }

        fn processor(&self) -> FileProcessor {
            FileProcessor::new(self.config.clone(), Arc::new(self.provider.clone())).unwrap()
        }

        async fn start(&self) -> FileProcessorHandle {
            self.processor().start().await.unwrap()
        }
    }

    async fn env() -> Env {
        let root = tempfile::tempdir().unwrap();
        let config = FileProcessorConfig {
            watch_path: root.path().join("incoming"),
            processed_path: root.path().join("processed"),
            error_path: root.path().join("errors"),
            poll_interval_ms: 20,
            ..FileProcessorConfig::default()
        };
        std::fs::create_dir_all(&config.watch_path).unwrap();

        let provider = InMemoryServiceProvider::new();
        seed(&provider).await;

        Env {
            _root: root,
            config,
            provider,
        }
    }

    /// Customer 1 and product P001.
    async fn seed(provider: &InMemoryServiceProvider) {
        provider
            .customers()
            .create(CustomerRequest {
                customer_identifier: "CUST-1".into(),
                name: "Acme Retail".into(),
                address: "1 Harbour Road".into(),
            })
            .await
            .unwrap();
        provider
            .products()
            .create(ProductRequest {
                product_code: ProductCode::new("P001").unwrap(),
                title: "Pallet jack".into(),
                description: None,
                dimensions: Dimensions::default(),
            })
            .await
            .unwrap();
    }

    async fn wait_for(mut condition: impl FnMut() -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        while !condition() {
            assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    const SALES_ORDER: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<SalesOrder>
  <OrderId>SO-1001</OrderId>
  <ProcessingDate>2024-05-02T08:30:00</ProcessingDate>
  <CustomerId>1</CustomerId>
  <ShipmentAddress>Dock 4, Harbour Road</ShipmentAddress>
  <Items>
    <Item><ProductCode>P001</ProductCode><Quantity>3</Quantity></Item>
  </Items>
</SalesOrder>"#;

    const PURCHASE_ORDER_INVALID_PRODUCT: &str = r#"<PurchaseOrder>
  <OrderId>PO-77</OrderId>
  <CustomerId>1</CustomerId>
  <Items>
    <Item><ProductCode>INVALID</ProductCode><Quantity>2</Quantity></Item>
  </Items>
</PurchaseOrder>"#;

    const PURCHASE_ORDER_NO_ITEMS: &str = r#"<PurchaseOrder>
  <OrderId>PO-78</OrderId>
  <CustomerId>1</CustomerId>
  <Items />
</PurchaseOrder>"#;

    #[tokio::test]
    async fn sales_order_is_created_and_file_processed() {
        let env = env().await;
        let handle = env.start().await;

        let dropped = env.drop_file("so-1001.xml", SALES_ORDER);
        let processed = env.processed().join("so-1001.xml");
        wait_for(|| processed.exists()).await;
        handle.stop().await;

        assert!(!dropped.exists());
        assert!(!env.errors().join("so-1001.xml").exists());
        assert!(!env.validation_errors().join("so-1001.xml").exists());

        let orders = env.provider.sales_orders().list();
        assert_eq!(orders.len(), 1);
        let order = &orders[0];
        assert_eq!(order.order_id().as_str(), "SO-1001");
        assert_eq!(order.customer_id().value(), 1);
        assert_eq!(order.shipment_address(), "Dock 4, Harbour Road");
        assert_eq!(order.lines().len(), 1);
        assert_eq!(order.lines()[0].product_code.as_str(), "P001");
        assert_eq!(order.lines()[0].quantity, 3);
    }

    #[tokio::test]
    async fn missing_product_is_reported_and_file_goes_to_errors() {
        let env = env().await;
        let processor = env.processor();

        let dropped = env.drop_file("po-77.xml", PURCHASE_ORDER_INVALID_PRODUCT);
        let report = processor.process_file(&dropped).await;

        match &report.outcome {
            ProcessingOutcome::Failed { kind, message } => {
                assert_eq!(*kind, FailureKind::ReferenceNotFound);
                assert!(message.contains("Product with code INVALID not found"), "{message}");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(report.placed_at, Some(env.errors().join("po-77.xml")));
        assert!(env.errors().join("po-77.xml").exists());
        assert!(!dropped.exists());
        assert!(env.provider.purchase_orders().list().is_empty());
    }

    #[tokio::test]
    async fn failures_are_sorted_into_error_areas() {
        let env = env().await;
        let handle = env.start().await;

        env.drop_file("empty-items.xml", PURCHASE_ORDER_NO_ITEMS);
        env.drop_file("invoice.xml", "<Invoice><Number>1</Number></Invoice>");
        env.drop_file("po-77.xml", PURCHASE_ORDER_INVALID_PRODUCT);
        env.drop_file("garbage.xml", "this is not xml");

        let expected = [
            env.validation_errors().join("empty-items.xml"),
            env.errors().join("invoice.xml"),
            env.errors().join("po-77.xml"),
            env.errors().join("garbage.xml"),
        ];
        wait_for(|| handle.stats().files_failed == 4 && expected.iter().all(|p| p.exists())).await;

        let stats = handle.stats();
        handle.stop().await;

        assert_eq!(stats.files_failed, 4);
        assert_eq!(stats.files_succeeded, 0);
        assert_eq!(stats.failures_by_kind.get("validation"), Some(&1));
        assert_eq!(stats.failures_by_kind.get("unknown_type"), Some(&1));
        assert_eq!(stats.failures_by_kind.get("reference_not_found"), Some(&1));
        assert_eq!(stats.failures_by_kind.get("malformed"), Some(&1));
        assert!(std::fs::read_dir(env.processed()).unwrap().next().is_none());
        assert!(env.provider.purchase_orders().list().is_empty());
    }

    #[tokio::test]
    async fn processed_files_are_not_picked_up_again() {
        let env = env().await;
        let handle = env.start().await;

        env.drop_file("so-1001.xml", SALES_ORDER);
        let processed = env.processed().join("so-1001.xml");
        wait_for(|| processed.exists() && handle.stats().in_flight == 0).await;

        // Several more poll cycles.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let stats = handle.stats();
        handle.stop().await;

        assert_eq!(stats.files_detected, 1);
        assert_eq!(stats.files_succeeded, 1);
        assert_eq!(env.provider.sales_orders().list().len(), 1);
        assert!(processed.exists());
    }

    #[tokio::test]
    async fn same_name_dropped_twice_is_kept_twice() {
        let env = env().await;
        let handle = env.start().await;

        let customer = |id: &str| {
            format!(
                "<Customer><CustomerIdentifier>{id}</CustomerIdentifier><Name>N</Name><Address>A</Address></Customer>"
            )
        };

        env.drop_file("customer.xml", &customer("C-10"));
        wait_for(|| env.processed().join("customer.xml").exists() && handle.stats().in_flight == 0).await;
        env.drop_file("customer.xml", &customer("C-11"));
        wait_for(|| env.processed().join("customer_1.xml").exists()).await;
        handle.stop().await;

        assert_eq!(env.provider.customers().len(), 3);
        let first = std::fs::read_to_string(env.processed().join("customer.xml")).unwrap();
        assert!(first.contains("C-10"));
    }

    #[tokio::test]
    async fn name_reused_within_one_poll_interval_is_processed() {
        let mut env = env().await;
        env.config.poll_interval_ms = 500;
        let handle = env.start().await;

        let customer = |id: &str| {
            format!(
                "<Customer><CustomerIdentifier>{id}</CustomerIdentifier><Name>N</Name><Address>A</Address></Customer>"
            )
        };

        env.drop_file("customer.xml", &customer("C-20"));
        wait_for(|| env.processed().join("customer.xml").exists() && handle.stats().in_flight == 0).await;
        // Re-dropped before the next scan can observe the directory without it.
        env.drop_file("customer.xml", &customer("C-21"));
        wait_for(|| env.processed().join("customer_1.xml").exists()).await;
        let stats = handle.stats();
        handle.stop().await;

        assert_eq!(stats.files_detected, 2);
        assert_eq!(env.provider.customers().len(), 3);
        assert!(std::fs::read_dir(env.watch()).unwrap().next().is_none());
        let second = std::fs::read_to_string(env.processed().join("customer_1.xml")).unwrap();
        assert!(second.contains("C-21"));
    }

    #[tokio::test]
    async fn failed_placement_is_counted_and_processing_continues() {
        let env = env().await;
        let handle = env.start().await;

        // The processed area becomes unusable after startup.
        std::fs::remove_dir(env.processed()).unwrap();
        std::fs::write(env.processed(), "not a directory").unwrap();

        let stuck = env.drop_file(
            "customer.xml",
            "<Customer><CustomerIdentifier>C-30</CustomerIdentifier><Name>N</Name><Address>A</Address></Customer>",
        );
        wait_for(|| handle.stats().placement_failures == 1 && handle.stats().in_flight == 0).await;

        env.drop_file("garbage.xml", "this is not xml");
        let rejected = env.errors().join("garbage.xml");
        wait_for(|| rejected.exists() && handle.stats().in_flight == 0).await;

        // Several more poll cycles; the unplaced file is not picked up again.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let stats = handle.stats();
        handle.stop().await;

        assert!(stuck.exists());
        assert_eq!(stats.files_detected, 2);
        assert_eq!(stats.files_succeeded, 1);
        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.placement_failures, 1);
        assert_eq!(env.provider.customers().len(), 2);
    }

    #[tokio::test]
    async fn files_present_at_startup_are_left_alone_by_default() {
        let env = env().await;
        let existing = env.drop_file("before.xml", SALES_ORDER);

        let handle = env.start().await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        let stats = handle.stats();
        handle.stop().await;

        assert!(existing.exists());
        assert_eq!(stats.files_detected, 0);
    }

    #[tokio::test]
    async fn process_existing_picks_up_startup_files() {
        let mut env = env().await;
        env.config.process_existing = true;
        env.drop_file("before.xml", SALES_ORDER);

        let handle = env.start().await;
        let processed = env.processed().join("before.xml");
        wait_for(|| processed.exists()).await;
        handle.stop().await;

        assert_eq!(env.provider.sales_orders().list().len(), 1);
    }

    #[tokio::test]
    async fn many_files_are_processed_concurrently_and_drained_on_stop() {
        let mut env = env().await;
        env.config.max_concurrent = 3;
        let handle = env.start().await;

        let count = 12;
        for i in 0..count {
            env.drop_file(
                &format!("p{i:02}.xml"),
                &format!("<Product><Code>BULK-{i}</Code><Title>Item {i}</Title><Weight>1.5</Weight></Product>"),
            );
        }
        wait_for(|| handle.stats().files_detected == count).await;
        handle.stop().await;

        // 12 from the drop plus the seeded P001.
        assert_eq!(env.provider.products().len(), count as usize + 1);
        for i in 0..count {
            assert!(env.processed().join(format!("p{i:02}.xml")).exists());
        }
        assert!(std::fs::read_dir(env.watch()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn non_matching_files_are_ignored() {
        let env = env().await;
        let handle = env.start().await;

        let note = env.drop_file("readme.txt", "not a document");
        env.drop_file("so.XML", SALES_ORDER);
        wait_for(|| env.processed().join("so.XML").exists()).await;
        handle.stop().await;

        assert!(note.exists());
    }
}
