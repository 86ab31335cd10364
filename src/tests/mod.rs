// Test modules for Chatdesk
// Each module covers the corresponding source module

mod driver_tests;
mod grouping_tests;
mod helpers;
mod message_tests;
