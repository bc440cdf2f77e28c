mod app_service_tests;
