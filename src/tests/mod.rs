mod db_tests;
mod file_service_tests;
