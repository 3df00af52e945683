mod feature_store_tests;
mod orderbook_properties;
mod processor_tests;
mod producer_tests;
