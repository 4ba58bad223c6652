mod define_wrapper_type;
