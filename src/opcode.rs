// SIG model opcodes. Two-byte opcodes go on the wire big-endian, one-byte
// opcodes as-is.

// Generic OnOff
pub const GEN_ONOFF_GET: u32 = 0x8201;
pub const GEN_ONOFF_SET: u32 = 0x8202;
pub const GEN_ONOFF_SET_UNACK: u32 = 0x8203;
pub const GEN_ONOFF_STATUS: u32 = 0x8204;

// Generic Level
pub const GEN_LEVEL_GET: u32 = 0x8205;
pub const GEN_LEVEL_SET: u32 = 0x8206;
pub const GEN_LEVEL_SET_UNACK: u32 = 0x8207;
pub const GEN_LEVEL_STATUS: u32 = 0x8208;
pub const GEN_DELTA_SET: u32 = 0x8209;
pub const GEN_DELTA_SET_UNACK: u32 = 0x820A;
pub const GEN_MOVE_SET: u32 = 0x820B;
pub const GEN_MOVE_SET_UNACK: u32 = 0x820C;

// Generic Default Transition Time
pub const GEN_DEF_TRANS_TIME_GET: u32 = 0x820D;
pub const GEN_DEF_TRANS_TIME_SET: u32 = 0x820E;
pub const GEN_DEF_TRANS_TIME_SET_UNACK: u32 = 0x820F;
pub const GEN_DEF_TRANS_TIME_STATUS: u32 = 0x8210;

// Generic Power OnOff
pub const GEN_ONPOWERUP_GET: u32 = 0x8211;
pub const GEN_ONPOWERUP_STATUS: u32 = 0x8212;
pub const GEN_ONPOWERUP_SET: u32 = 0x8213;
pub const GEN_ONPOWERUP_SET_UNACK: u32 = 0x8214;

// Generic Power Level
pub const GEN_POWER_LEVEL_GET: u32 = 0x8215;
pub const GEN_POWER_LEVEL_SET: u32 = 0x8216;
pub const GEN_POWER_LEVEL_SET_UNACK: u32 = 0x8217;
pub const GEN_POWER_LEVEL_STATUS: u32 = 0x8218;
pub const GEN_POWER_LAST_GET: u32 = 0x8219;
pub const GEN_POWER_LAST_STATUS: u32 = 0x821A;
pub const GEN_POWER_DEFAULT_GET: u32 = 0x821B;
pub const GEN_POWER_DEFAULT_STATUS: u32 = 0x821C;
pub const GEN_POWER_RANGE_GET: u32 = 0x821D;
pub const GEN_POWER_RANGE_STATUS: u32 = 0x821E;
pub const GEN_POWER_DEFAULT_SET: u32 = 0x821F;
pub const GEN_POWER_DEFAULT_SET_UNACK: u32 = 0x8220;
pub const GEN_POWER_RANGE_SET: u32 = 0x8221;
pub const GEN_POWER_RANGE_SET_UNACK: u32 = 0x8222;

// Light Lightness
pub const LIGHT_LIGHTNESS_GET: u32 = 0x824B;
pub const LIGHT_LIGHTNESS_SET: u32 = 0x824C;
pub const LIGHT_LIGHTNESS_SET_UNACK: u32 = 0x824D;
pub const LIGHT_LIGHTNESS_STATUS: u32 = 0x824E;
pub const LIGHT_LIGHTNESS_LINEAR_GET: u32 = 0x824F;
pub const LIGHT_LIGHTNESS_LINEAR_SET: u32 = 0x8250;
pub const LIGHT_LIGHTNESS_LINEAR_SET_UNACK: u32 = 0x8251;
pub const LIGHT_LIGHTNESS_LINEAR_STATUS: u32 = 0x8252;
pub const LIGHT_LIGHTNESS_LAST_GET: u32 = 0x8253;
pub const LIGHT_LIGHTNESS_LAST_STATUS: u32 = 0x8254;
pub const LIGHT_LIGHTNESS_DEFAULT_GET: u32 = 0x8255;
pub const LIGHT_LIGHTNESS_DEFAULT_STATUS: u32 = 0x8256;
pub const LIGHT_LIGHTNESS_RANGE_GET: u32 = 0x8257;
pub const LIGHT_LIGHTNESS_RANGE_STATUS: u32 = 0x8258;
pub const LIGHT_LIGHTNESS_DEFAULT_SET: u32 = 0x8259;
pub const LIGHT_LIGHTNESS_DEFAULT_SET_UNACK: u32 = 0x825A;
pub const LIGHT_LIGHTNESS_RANGE_SET: u32 = 0x825B;
pub const LIGHT_LIGHTNESS_RANGE_SET_UNACK: u32 = 0x825C;

// Light CTL
pub const LIGHT_CTL_GET: u32 = 0x825D;
pub const LIGHT_CTL_SET: u32 = 0x825E;
pub const LIGHT_CTL_SET_UNACK: u32 = 0x825F;
pub const LIGHT_CTL_STATUS: u32 = 0x8260;
pub const LIGHT_CTL_TEMPERATURE_GET: u32 = 0x8261;
pub const LIGHT_CTL_TEMPERATURE_RANGE_GET: u32 = 0x8262;
pub const LIGHT_CTL_TEMPERATURE_RANGE_STATUS: u32 = 0x8263;
pub const LIGHT_CTL_TEMPERATURE_SET: u32 = 0x8264;
pub const LIGHT_CTL_TEMPERATURE_SET_UNACK: u32 = 0x8265;
pub const LIGHT_CTL_TEMPERATURE_STATUS: u32 = 0x8266;
pub const LIGHT_CTL_DEFAULT_GET: u32 = 0x8267;
pub const LIGHT_CTL_DEFAULT_STATUS: u32 = 0x8268;
pub const LIGHT_CTL_DEFAULT_SET: u32 = 0x8269;
pub const LIGHT_CTL_DEFAULT_SET_UNACK: u32 = 0x826A;
pub const LIGHT_CTL_TEMPERATURE_RANGE_SET: u32 = 0x826B;
pub const LIGHT_CTL_TEMPERATURE_RANGE_SET_UNACK: u32 = 0x826C;

// Light HSL
pub const LIGHT_HSL_GET: u32 = 0x826D;
pub const LIGHT_HSL_HUE_GET: u32 = 0x826E;
pub const LIGHT_HSL_HUE_SET: u32 = 0x826F;
pub const LIGHT_HSL_HUE_SET_UNACK: u32 = 0x8270;
pub const LIGHT_HSL_HUE_STATUS: u32 = 0x8271;
pub const LIGHT_HSL_SATURATION_GET: u32 = 0x8272;
pub const LIGHT_HSL_SATURATION_SET: u32 = 0x8273;
pub const LIGHT_HSL_SATURATION_SET_UNACK: u32 = 0x8274;
pub const LIGHT_HSL_SATURATION_STATUS: u32 = 0x8275;
pub const LIGHT_HSL_SET: u32 = 0x8276;
pub const LIGHT_HSL_SET_UNACK: u32 = 0x8277;
pub const LIGHT_HSL_STATUS: u32 = 0x8278;
pub const LIGHT_HSL_TARGET_GET: u32 = 0x8279;
pub const LIGHT_HSL_TARGET_STATUS: u32 = 0x827A;
pub const LIGHT_HSL_DEFAULT_GET: u32 = 0x827B;
pub const LIGHT_HSL_DEFAULT_STATUS: u32 = 0x827C;
pub const LIGHT_HSL_RANGE_GET: u32 = 0x827D;
pub const LIGHT_HSL_RANGE_STATUS: u32 = 0x827E;
pub const LIGHT_HSL_DEFAULT_SET: u32 = 0x827F;
pub const LIGHT_HSL_DEFAULT_SET_UNACK: u32 = 0x8280;
pub const LIGHT_HSL_RANGE_SET: u32 = 0x8281;
pub const LIGHT_HSL_RANGE_SET_UNACK: u32 = 0x8282;

// Light xyL
pub const LIGHT_XYL_GET: u32 = 0x8283;
pub const LIGHT_XYL_SET: u32 = 0x8284;
pub const LIGHT_XYL_SET_UNACK: u32 = 0x8285;
pub const LIGHT_XYL_STATUS: u32 = 0x8286;
pub const LIGHT_XYL_TARGET_GET: u32 = 0x8287;
pub const LIGHT_XYL_TARGET_STATUS: u32 = 0x8288;
pub const LIGHT_XYL_DEFAULT_GET: u32 = 0x8289;
pub const LIGHT_XYL_DEFAULT_STATUS: u32 = 0x828A;
pub const LIGHT_XYL_RANGE_GET: u32 = 0x828B;
pub const LIGHT_XYL_RANGE_STATUS: u32 = 0x828C;
pub const LIGHT_XYL_DEFAULT_SET: u32 = 0x828D;
pub const LIGHT_XYL_DEFAULT_SET_UNACK: u32 = 0x828E;
pub const LIGHT_XYL_RANGE_SET: u32 = 0x828F;
pub const LIGHT_XYL_RANGE_SET_UNACK: u32 = 0x8290;

// Light LC
pub const LIGHT_LC_MODE_GET: u32 = 0x8291;
pub const LIGHT_LC_MODE_SET: u32 = 0x8292;
pub const LIGHT_LC_MODE_SET_UNACK: u32 = 0x8293;
pub const LIGHT_LC_MODE_STATUS: u32 = 0x8294;
pub const LIGHT_LC_OM_GET: u32 = 0x8295;
pub const LIGHT_LC_OM_SET: u32 = 0x8296;
pub const LIGHT_LC_OM_SET_UNACK: u32 = 0x8297;
pub const LIGHT_LC_OM_STATUS: u32 = 0x8298;
pub const LIGHT_LC_LIGHT_ONOFF_GET: u32 = 0x8299;
pub const LIGHT_LC_LIGHT_ONOFF_SET: u32 = 0x829A;
pub const LIGHT_LC_LIGHT_ONOFF_SET_UNACK: u32 = 0x829B;
pub const LIGHT_LC_LIGHT_ONOFF_STATUS: u32 = 0x829C;

// Time
pub const TIME_GET: u32 = 0x8237;
pub const TIME_SET: u32 = 0x5C;
pub const TIME_STATUS: u32 = 0x5D;
pub const TIME_ROLE_GET: u32 = 0x8238;
pub const TIME_ROLE_SET: u32 = 0x8239;
pub const TIME_ROLE_STATUS: u32 = 0x823A;
pub const TIME_ZONE_GET: u32 = 0x823B;
pub const TIME_ZONE_SET: u32 = 0x823C;
pub const TIME_ZONE_STATUS: u32 = 0x823D;
pub const TAI_UTC_DELTA_GET: u32 = 0x823E;
pub const TAI_UTC_DELTA_SET: u32 = 0x823F;
pub const TAI_UTC_DELTA_STATUS: u32 = 0x8240;

// Scene
pub const SCENE_GET: u32 = 0x8241;
pub const SCENE_RECALL: u32 = 0x8242;
pub const SCENE_RECALL_UNACK: u32 = 0x8243;
pub const SCENE_STATUS: u32 = 0x5E;
pub const SCENE_REGISTER_GET: u32 = 0x8244;
pub const SCENE_REGISTER_STATUS: u32 = 0x8245;
pub const SCENE_STORE: u32 = 0x8246;
pub const SCENE_STORE_UNACK: u32 = 0x8247;
pub const SCENE_DELETE: u32 = 0x829E;
pub const SCENE_DELETE_UNACK: u32 = 0x829F;

// Scheduler
pub const SCHEDULER_ACT_GET: u32 = 0x8248;
pub const SCHEDULER_ACT_STATUS: u32 = 0x5F;
pub const SCHEDULER_GET: u32 = 0x8249;
pub const SCHEDULER_STATUS: u32 = 0x824A;
pub const SCHEDULER_ACT_SET: u32 = 0x60;
pub const SCHEDULER_ACT_SET_UNACK: u32 = 0x61;
