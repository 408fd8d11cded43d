//! Helper macros for the serial port utilities.

/// Generate debug formatting code for a [`SerialPort`](serialport::SerialPort)
/// like struct.
macro_rules! debug_fmt_serialport {
    ($port:expr, $f:ident) => {
        $f.debug_tuple("SerialPort")
            .field(&$port.name())
            .field(&$port.baud_rate())
            .field(&$port.data_bits())
            .field(&$port.stop_bits())
            .field(&$port.parity())
            .field(&$port.flow_control())
    };
}
