pub mod callback_reader;
pub mod record_writer;
