pub mod detection {
    pub mod domain {
        pub mod candidate_detector;
        pub mod face_locator;
    }
    pub mod infrastructure;
}

pub mod identity {
    pub mod domain {
        pub mod embedding_provider;
        pub mod reference_descriptor;
    }
    pub mod infrastructure;
}

pub mod matching {
    pub mod domain {
        pub mod identity_matcher;
        pub mod match_result;
        pub mod work_item;
    }
    pub mod infrastructure;
}

pub mod overlay {
    pub mod domain {
        pub mod frame_overlay;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod cadence_controller;
    pub mod enroll_reference_use_case;
    pub mod session_logger;
    pub mod session_state;
}

pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod model_resolver;
    pub mod region;
    pub mod tracking_config;
    pub mod video_metadata;
}

pub mod video {
    pub mod domain {
        pub mod display_sink;
        pub mod frame_source;
        pub mod still_image_reader;
    }
    pub mod infrastructure;
}
